//! Text cleanup applied before handing a run to a speech engine.

use crate::language::is_persian_char;

/// Whether `ch` is an emoji, pictograph or emoji presentation modifier.
///
/// Outside the pictograph planes only the code points with an emoji
/// presentation are listed, so plain arrows and technical symbols such as
/// `→` and `⌘` survive.
fn is_emoji(ch: char) -> bool {
    matches!(ch,
        '\u{1F000}'..='\u{1FAFF}' |  // Mahjong .. Symbols and Pictographs Extended-A, flags
        '\u{2600}'..='\u{27BF}' |    // Misc Symbols, Dingbats
        '\u{231A}'..='\u{231B}' | '\u{2328}' | '\u{23CF}' |
        '\u{23E9}'..='\u{23F3}' | '\u{23F8}'..='\u{23FA}' |
        '\u{2B05}'..='\u{2B07}' | '\u{2B1B}'..='\u{2B1C}' | '\u{2B50}' | '\u{2B55}' |
        '\u{2194}'..='\u{2199}' | '\u{21A9}'..='\u{21AA}' | '\u{2934}'..='\u{2935}' |
        '\u{25AA}'..='\u{25AB}' | '\u{25B6}' | '\u{25C0}' | '\u{25FB}'..='\u{25FE}' |
        '\u{FE00}'..='\u{FE0F}' |    // Variation selectors
        '\u{E0020}'..='\u{E007F}' |  // Tag sequences
        '\u{200D}' | '\u{20E3}' |    // ZWJ, combining keycap
        '\u{203C}' | '\u{2049}' | '\u{2122}' | '\u{2139}' | '\u{24C2}' |
        '\u{00A9}' | '\u{00AE}' |
        '\u{3030}' | '\u{303D}' | '\u{3297}' | '\u{3299}'
    )
}

/// Whether `rest` continues a keycap: optional VS16, then U+20E3.
fn continues_keycap(mut rest: impl Iterator<Item = char>) -> bool {
    match rest.next() {
        Some('\u{20E3}') => true,
        Some('\u{FE0F}') => rest.next() == Some('\u{20E3}'),
        _ => false,
    }
}

/// Drop emoji, including the base of keycap sequences like `1️⃣`, and every
/// character `keep` rejects.
fn retain_speakable(text: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if matches!(c, '0'..='9' | '#' | '*') && continues_keycap(chars.clone()) {
            continue;
        }
        if !is_emoji(c) && keep(c) {
            out.push(c);
        }
    }
    out
}

/// Remove emoji without touching anything else.
pub fn strip_emoji(text: &str) -> String {
    retain_speakable(text, |_| true)
}

/// Remove emoji and control characters, keeping all other text as is.
///
/// Whitespace controls (tab, newline) are kept; the engine treats them as pauses.
pub fn strip_unspeakable(text: &str) -> String {
    retain_speakable(text, |c| !c.is_control() || c.is_whitespace())
}

fn is_persian_allowed(ch: char) -> bool {
    is_persian_char(ch) || ch.is_ascii_alphanumeric() || matches!(ch, '.' | ',' | '?' | '!' | ' ')
}

/// Clean text for the Persian engine.
///
/// Emoji are dropped, every other character outside the Arabic block, ASCII
/// letters and digits, `.,?!` and space becomes a space, and the result is
/// trimmed. Runs of spaces are not collapsed.
pub fn clean_persian(text: &str) -> String {
    let replaced: String = strip_emoji(text)
        .chars()
        .map(|c| if is_persian_allowed(c) { c } else { ' ' })
        .collect();
    replaced.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{clean_persian, strip_emoji, strip_unspeakable};

    #[test]
    fn strips_emoji_sequences() {
        assert_eq!(strip_emoji("Hi 👋🏽 there ❤️"), "Hi  there ");
        assert_eq!(strip_emoji("👨‍👩‍👧"), "");
        assert_eq!(strip_emoji("🇮🇷"), "");
    }

    #[test]
    fn strips_keycaps_but_not_plain_digits() {
        assert_eq!(strip_emoji("1\u{FE0F}\u{20E3} 2"), " 2");
        assert_eq!(strip_emoji("#\u{20E3}*\u{FE0F}\u{20E3}"), "");
        assert_eq!(strip_emoji("5 * 3 = 15 #1"), "5 * 3 = 15 #1");
        assert_eq!(clean_persian("۱ 1\u{FE0F}\u{20E3} سلام"), "۱  سلام");
    }

    #[test]
    fn strips_emoji_punctuation_and_enclosed_letters() {
        assert_eq!(strip_emoji("Really\u{203C} \u{2049} \u{24C2}"), "Really  ");
        assert_eq!(strip_emoji("\u{2139}\u{FE0F} info"), " info");
    }

    #[test]
    fn keeps_plain_arrows_and_symbols() {
        assert_eq!(strip_emoji("a → b ⇒ c ⌘"), "a → b ⇒ c ⌘");
        assert_eq!(strip_emoji("\u{2194}\u{FE0F}\u{2B06}"), "");
    }

    #[test]
    fn keeps_persian_and_latin_text() {
        assert_eq!(strip_emoji("سلام Hello"), "سلام Hello");
    }

    #[test]
    fn unspeakable_keeps_whitespace_but_drops_controls() {
        assert_eq!(strip_unspeakable("a\u{0007}b\tc 🎉"), "ab\tc ");
    }

    #[test]
    fn persian_cleaning_replaces_disallowed_characters_with_spaces() {
        assert_eq!(clean_persian("«سلام»"), "سلام");
        assert_eq!(clean_persian("سلام؛ خوبی"), "سلام؛ خوبی");
        assert_eq!(clean_persian("a-b"), "a b");
        assert_eq!(clean_persian("می\u{200c}خواهم"), "می خواهم");
    }

    #[test]
    fn persian_cleaning_keeps_allowed_punctuation() {
        assert_eq!(clean_persian("  خوبی? بله! 12, 3.  "), "خوبی? بله! 12, 3.");
    }

    #[test]
    fn persian_cleaning_of_emoji_only_is_empty() {
        assert_eq!(clean_persian("😀 🎉 ✨"), "");
        assert_eq!(clean_persian(""), "");
    }
}
