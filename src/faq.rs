//! Self-growing FAQ: every answered question is either merged into a similar
//! earlier question (bumping its counter) or stored as a new entry.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::BoxError;

/// Questions more similar than this are treated as the same question.
pub const SIMILARITY_THRESHOLD: f32 = 0.85;
/// Minimum ask count for an entry to be listed as popular.
pub const POPULAR_MIN_COUNT: u32 = 3;
/// Maximum number of popular entries returned.
pub const POPULAR_LIMIT: usize = 10;
/// From this length on, characters filling more than 1% of the second
/// string are not used to seed matches.
const AUTOJUNK_MIN_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub ask_count: u32,
    pub created_at: SystemTime,
}

/// Storage for FAQ entries. Implemented by the application's database layer.
pub trait FaqStore {
    /// All entries in insertion order.
    fn entries(&self) -> Result<Vec<FaqEntry>, BoxError>;

    /// Store a new entry with an ask count of 1.
    fn insert(&mut self, question: &str, answer: &str) -> Result<FaqEntry, BoxError>;

    /// Increment the ask count of entry `id`, returning the new count.
    fn increment(&mut self, id: u64) -> Result<u32, BoxError>;
}

/// In-process [`FaqStore`].
#[derive(Debug, Default)]
pub struct MemoryFaqStore {
    entries: Vec<FaqEntry>,
    next_id: u64,
}

impl FaqStore for MemoryFaqStore {
    fn entries(&self) -> Result<Vec<FaqEntry>, BoxError> {
        Ok(self.entries.clone())
    }

    fn insert(&mut self, question: &str, answer: &str) -> Result<FaqEntry, BoxError> {
        self.next_id += 1;
        let entry = FaqEntry {
            id: self.next_id,
            question: question.to_string(),
            answer: answer.to_string(),
            ask_count: 1,
            created_at: SystemTime::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn increment(&mut self, id: u64) -> Result<u32, BoxError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| format!("FAQ entry {id} not found"))?;
        entry.ask_count += 1;
        Ok(entry.ask_count)
    }
}

/// Character-level similarity of two questions in `[0, 1]`, ignoring case
/// and surrounding whitespace.
///
/// This is the Ratcliff/Obershelp ratio `2 * M / (len(a) + len(b))`, where
/// `M` counts the characters in the longest common block and, recursively,
/// in the longest blocks to its left and right. Blocks are matched in order,
/// so reordered words score lower than a plain LCS would give.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(&a, &b).matching_chars();
    (2.0 * matched as f64 / total as f64) as f32
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, minus autojunked characters.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    /// Longest block `a[i..i + k] == b[j..j + k]` inside the given ranges,
    /// earliest in `a` and then in `b` on ties. Returns `(i, j, k)`.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        // Length of the match ending at a[i - 1] and b[j], keyed by j.
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = j.checked_sub(1).and_then(|p| j2len.get(&p));
                    let k = prev.copied().unwrap_or(0) + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next;
        }

        // Autojunked characters never seed a match but may still extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }
        (best_i, best_j, best_k)
    }

    /// Total size of the matching blocks.
    fn matching_chars(&self) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }
}

/// What [`FaqCache::record`] did with a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// Merged into an existing entry, which now has `ask_count` asks.
    Existing { id: u64, ask_count: u32 },
    New { id: u64 },
}

#[derive(Debug)]
pub struct FaqCache<S> {
    store: S,
}

impl<S: FaqStore> FaqCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count `question` against the first sufficiently similar entry, or add it.
    pub fn record(&mut self, question: &str, answer: &str) -> Result<Recorded, BoxError> {
        let existing = self
            .store
            .entries()?
            .into_iter()
            .find(|e| similarity(question, &e.question) > SIMILARITY_THRESHOLD);

        match existing {
            Some(entry) => {
                let ask_count = self.store.increment(entry.id)?;
                log::debug!("FAQ {} asked {ask_count} times", entry.id);
                Ok(Recorded::Existing {
                    id: entry.id,
                    ask_count,
                })
            }
            None => {
                let entry = self.store.insert(question, answer)?;
                Ok(Recorded::New { id: entry.id })
            }
        }
    }

    /// Most asked entries: at least [`POPULAR_MIN_COUNT`] asks, most asked
    /// first, at most [`POPULAR_LIMIT`].
    pub fn popular(&self) -> Result<Vec<FaqEntry>, BoxError> {
        let mut entries: Vec<FaqEntry> = self
            .store
            .entries()?
            .into_iter()
            .filter(|e| e.ask_count >= POPULAR_MIN_COUNT)
            .collect();
        entries.sort_by(|a, b| b.ask_count.cmp(&a.ask_count));
        entries.truncate(POPULAR_LIMIT);
        Ok(entries)
    }
}
