//! Chat turn handling around an external reply model.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::faq::{FaqCache, FaqStore};
use crate::BoxError;

/// Messages kept per conversation.
pub const HISTORY_LIMIT: usize = 16;
/// Messages included as context in each prompt.
pub const CONTEXT_MESSAGES: usize = 4;

const PREAMBLE: &str = "You are a helpful assistant for Persian speakers. \
Keep answers short, clear, and useful. \
If the user asks about English grammar, explain with examples.";

/// Reply to an empty message.
pub const EMPTY_MESSAGE_REPLY: &str = "لطفاً یک پیام وارد کنید.";
/// Reply when the model or FAQ storage fails.
pub const FAILURE_REPLY: &str = "متاسفانه مشکلی پیش آمد.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// The most recent messages of one conversation, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: VecDeque<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.messages.push_back(ChatMessage {
            sender,
            text: text.into(),
        });
        while self.messages.len() > HISTORY_LIMIT {
            self.messages.pop_front();
        }
    }

    /// The last `n` messages as `User: ...` / `Assistant: ...` lines.
    pub fn context(&self, n: usize) -> String {
        let skip = self.messages.len().saturating_sub(n);
        self.messages
            .iter()
            .skip(skip)
            .map(|m| {
                let role = match m.sender {
                    Sender::User => "User",
                    Sender::Bot => "Assistant",
                };
                format!("{role}: {}\n", m.text)
            })
            .collect()
    }
}

/// Build the model prompt for `message` given the conversation so far.
pub fn build_prompt(history: &ChatHistory, message: &str) -> String {
    format!(
        "{PREAMBLE}\n\n{}User: {message}\nAssistant:",
        history.context(CONTEXT_MESSAGES)
    )
}

/// The conversational model. Blocking, no streaming.
pub trait ReplyGenerator {
    fn generate_reply(&self, prompt: &str) -> Result<String, BoxError>;
}

impl<F> ReplyGenerator for F
where
    F: Fn(&str) -> Result<String, BoxError>,
{
    fn generate_reply(&self, prompt: &str) -> Result<String, BoxError> {
        self(prompt)
    }
}

/// Answers chat messages and feeds every answered question into the FAQ.
#[derive(Debug)]
pub struct Assistant<G, S> {
    generator: G,
    faq: FaqCache<S>,
}

impl<G: ReplyGenerator, S: FaqStore> Assistant<G, S> {
    pub fn new(generator: G, faq: FaqCache<S>) -> Self {
        Self { generator, faq }
    }

    pub fn faq(&self) -> &FaqCache<S> {
        &self.faq
    }

    /// Answer `message`, updating `history` only when an answer was produced.
    ///
    /// Never fails: errors are logged and answered with [`FAILURE_REPLY`].
    pub fn respond(&mut self, history: &mut ChatHistory, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return EMPTY_MESSAGE_REPLY.to_string();
        }

        match self.answer(history, message) {
            Ok(answer) => {
                history.push(Sender::User, message);
                history.push(Sender::Bot, answer.clone());
                answer
            }
            Err(e) => {
                log::error!("Chat error: {e}");
                FAILURE_REPLY.to_string()
            }
        }
    }

    fn answer(&mut self, history: &ChatHistory, message: &str) -> Result<String, BoxError> {
        let prompt = build_prompt(history, message);
        let answer = self.generator.generate_reply(&prompt)?;
        self.faq.record(message, &answer)?;
        Ok(answer)
    }
}
