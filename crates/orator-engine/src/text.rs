//! Text normalization applied before speech

use std::sync::LazyLock;

use regex::Regex;

/// Patterns applied in order, each replaced by its first capture group or removed
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\*\*(.*?)\*\*", "$1"),
        (r"__(.*?)__", "$1"),
        (r"\*(.*?)\*", "$1"),
        (r"_(.*?)_", "$1"),
        (r"\[([^\]]+)\]\([^)]+\)", "$1"),
        (r"`([^`]+)`", "$1"),
        (r"(?m)^>\s?", ""),
        (r"(?m)^#+\s?", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("must be valid regex"), replacement))
    .collect()
});

/// Remove common Markdown syntax so engines do not read it aloud
///
/// Strips emphasis markers, link targets, inline code ticks, blockquote and
/// heading markers, then trims surrounding whitespace.
pub fn strip_markdown(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in RULES.iter() {
        if let std::borrow::Cow::Owned(replaced) = re.replace_all(&out, *replacement) {
            out = replaced;
        }
    }
    out.trim().to_string()
}
