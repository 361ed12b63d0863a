//! Cleanup and truncation of text before it is shown on Discord.

use std::sync::LazyLock;

use regex::Regex;

/// Default cut-off for embed descriptions, a little under Discord's hard limits.
pub const DEFAULT_MAX_LENGTH: usize = 1950;

/// Appended to text that had to be cut.
const ELLIPSIS: &str = "...";

static REPEATED_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());

/// Matches a bulleted line that starts with a label, e.g. `- Label:`.
static BULLET_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*([*+-])\s+(.*?):").unwrap());

/// Collapses runs of spaces, trims the ends and bolds list items that lead with a label.
///
/// `"- Label: value"` becomes `"**- Label:** value"`. The substitution runs once,
/// so text that is already bold is not wrapped again.
pub fn format_response(text: &str) -> String {
    let collapsed = REPEATED_SPACES.replace_all(text, " ");
    let trimmed = collapsed.trim();
    BULLET_LABEL
        .replace_all(trimmed, "**${1} ${2}:**")
        .into_owned()
}

/// Cuts `text` to `max_length` characters, adding an ellipsis when anything was dropped.
///
/// Counts characters, not bytes, so multi-byte text is never split inside a code point.
/// Words may be cut in half.
pub fn truncate(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &text[..byte_idx]),
        None => text.to_string(),
    }
}
