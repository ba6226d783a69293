//! Full-width punctuation normalization for on-screen text.
//!
//! Subtitles read better without sentence punctuation. Commas, stops and
//! exclamation marks become spaces while quotation marks become corner
//! brackets. A question mark becomes the particle `吗`.

/// Substitutions applied in order to the text field of translated lines.
///
/// A question mark turns into the particle `吗` unless one already
/// precedes it, so `吗？` must come before `？`.
pub const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("，", " "),
    ("。", " "),
    ("、", " "),
    ("“", "「"),
    ("”", "」"),
    ("《", "『"),
    ("》", "』"),
    ("！", " "),
    ("吗？", "吗"),
    ("？", "吗"),
];

/// Applies [`SUBSTITUTIONS`] and trims trailing whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to));
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_sentence_punctuation() {
        assert_eq!(normalize("你好，你好吗"), "你好 你好吗");
        assert_eq!(normalize("是的。走吧！"), "是的 走吧");
    }

    #[test]
    fn test_normalize_turns_question_mark_into_particle() {
        assert_eq!(normalize("真的？"), "真的吗");
        assert_eq!(normalize("你好吗？"), "你好吗");
        assert_eq!(normalize("是吗？真的？"), "是吗真的吗");
    }

    #[test]
    fn test_normalize_converts_quotes_to_brackets() {
        assert_eq!(normalize("他说“好”"), "他说「好」");
        assert_eq!(normalize("《三体》"), "『三体』");
    }

    #[test]
    fn test_normalize_leaves_other_text_alone() {
        assert_eq!(normalize("Hello, world."), "Hello, world.");
        assert_eq!(normalize(r"line\Nbreak"), r"line\Nbreak");
    }

    #[test]
    fn test_normalize_keeps_leading_whitespace() {
        assert_eq!(normalize("，开始"), " 开始");
    }
}
