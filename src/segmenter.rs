use serde::Serialize;

use crate::language::{classify, Language};

/// A maximal run of consecutive words spoken in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub language: Language,
    pub text: String,
}

impl Segment {
    fn new(language: Language, word: &str) -> Self {
        Self {
            language,
            text: word.to_string(),
        }
    }
}

/// Split `text` into same-language runs, preserving word order.
///
/// Words are separated by any whitespace and re-joined with single spaces, so
/// joining every segment's text with `' '` yields the whitespace-normalized
/// input.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = Segment::new(classify(first), first);

    for word in words {
        let language = classify(word);
        if language == current.language {
            current.text.push(' ');
            current.text.push_str(word);
        } else {
            segments.push(std::mem::replace(&mut current, Segment::new(language, word)));
        }
    }

    segments.push(current);
    segments
}

#[cfg(test)]
mod tests {
    use super::{segment, Segment};
    use crate::language::Language;

    fn seg(language: Language, text: &str) -> Segment {
        Segment {
            language,
            text: text.to_string(),
        }
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(segment("").is_empty());
        assert!(segment("  \t\n ").is_empty());
    }

    #[test]
    fn english_sentence_is_one_segment() {
        assert_eq!(segment("Hello world"), vec![seg(Language::En, "Hello world")]);
    }

    #[test]
    fn persian_sentence_is_one_segment() {
        assert_eq!(segment("سلام دنیا"), vec![seg(Language::Fa, "سلام دنیا")]);
    }

    #[test]
    fn mixed_sentence_alternates_in_order() {
        assert_eq!(
            segment("Hello سلام world"),
            vec![
                seg(Language::En, "Hello"),
                seg(Language::Fa, "سلام"),
                seg(Language::En, "world"),
            ]
        );
    }

    #[test]
    fn punctuation_only_words_join_persian_runs() {
        assert_eq!(
            segment("کلمه grammar یعنی ؟ !"),
            vec![
                seg(Language::Fa, "کلمه"),
                seg(Language::En, "grammar"),
                seg(Language::Fa, "یعنی ؟ !"),
            ]
        );
    }

    #[test]
    fn segments_reconstruct_normalized_input() {
        let inputs = [
            "  The word   «کتاب» means\tbook in English.  ",
            "من   English را دوست دارم 😀 ok",
            "single",
        ];
        for input in inputs {
            let segments = segment(input);
            assert!(!segments.is_empty());
            let joined = segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(joined, normalized);
            for pair in segments.windows(2) {
                assert_ne!(pair[0].language, pair[1].language);
            }
        }
    }
}
