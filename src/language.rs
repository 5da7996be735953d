use std::fmt;
use std::sync::OnceLock;

use lingua::{LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// The two languages the pipeline can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fa,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fa => "fa",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

static DETECTOR: OnceLock<LanguageDetector> = OnceLock::new();

fn detector() -> &'static LanguageDetector {
    DETECTOR.get_or_init(|| {
        LanguageDetectorBuilder::from_languages(&[
            lingua::Language::English,
            lingua::Language::Persian,
            lingua::Language::Arabic,
            lingua::Language::Urdu,
        ])
        .with_minimum_relative_distance(0.1)
        .build()
    })
}

/// Whether `ch` lies in the Arabic block (U+0600..=U+06FF) used by Persian.
pub fn is_persian_char(ch: char) -> bool {
    matches!(ch, '\u{0600}'..='\u{06FF}')
}

/// Decide whether a single whitespace-free token is English or Persian.
///
/// Latin letters win over Persian letters, so a mixed token such as `"API‌ها"`
/// is spoken by the English engine. Tokens with neither (digits, punctuation,
/// emoji, other scripts) go through the statistical detector; anything it
/// cannot confidently call English is treated as Persian.
pub fn classify(token: &str) -> Language {
    if token.chars().any(|c| c.is_ascii_alphabetic()) {
        return Language::En;
    }
    if token.chars().any(is_persian_char) {
        return Language::Fa;
    }

    match detector().detect_language_of(token) {
        Some(lingua::Language::English) => Language::En,
        Some(other) => {
            log::debug!("Token {token:?} detected as {other:?}, speaking as Persian");
            Language::Fa
        }
        None => Language::Fa,
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Language};

    #[test]
    fn latin_letters_are_english() {
        assert_eq!(classify("Hello"), Language::En);
        assert_eq!(classify("world!"), Language::En);
        assert_eq!(classify("C3PO"), Language::En);
    }

    #[test]
    fn persian_letters_are_persian() {
        assert_eq!(classify("سلام"), Language::Fa);
        assert_eq!(classify("دنیا؟"), Language::Fa);
    }

    #[test]
    fn latin_takes_priority_over_persian() {
        assert_eq!(classify("API\u{200c}ها"), Language::En);
    }

    #[test]
    fn tokens_without_letters_default_to_persian() {
        assert_eq!(classify("123"), Language::Fa);
        assert_eq!(classify("..."), Language::Fa);
        assert_eq!(classify("\u{1F600}"), Language::Fa);
    }

    #[test]
    fn language_serializes_as_code() {
        let json = serde_json::to_string(&Language::Fa).unwrap();
        assert_eq!(json, "\"fa\"");
        assert_eq!(Language::En.to_string(), "en");
    }
}
