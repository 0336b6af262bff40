//! Completion marker protocol
//!
//! The model closes a briefing by emitting
//!
//! ```text
//! [ONE_THING_SELECTED]
//! task: <exact task title>
//! goal: <one-sentence reason>
//! [/ONE_THING_SELECTED]
//! ```
//!
//! Parsing and stripping of that block are kept together here so the text
//! contract can be replaced by structured output in one place.

use super::types::BriefingResult;
use regex::Regex;
use std::sync::OnceLock;

pub const SELECTION_OPEN: &str = "[ONE_THING_SELECTED]";
pub const SELECTION_CLOSE: &str = "[/ONE_THING_SELECTED]";

const SELECTION_PATTERN: &str =
    r"\[ONE_THING_SELECTED\]\s*task:\s*([\s\S]+?)\s*goal:\s*([\s\S]+?)\s*\[/ONE_THING_SELECTED\]";
const BLOCK_PATTERN: &str = r"\[ONE_THING_SELECTED\][\s\S]*\[/ONE_THING_SELECTED\]";

fn selection_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(SELECTION_PATTERN).expect("selection pattern is valid"))
}

fn block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(BLOCK_PATTERN).expect("block pattern is valid"))
}

/// Extract the selection payload, or `None` while the conversation is still open.
pub fn parse_selection(text: &str) -> Option<BriefingResult> {
    let captures = selection_regex().captures(text)?;
    Some(BriefingResult {
        task_title: captures.get(1)?.as_str().trim().to_string(),
        goal: captures.get(2)?.as_str().trim().to_string(),
    })
}

/// Text safe to show the user: marker blocks removed, surrounding space trimmed.
///
/// A block that has been opened but not yet closed (mid-stream) is hidden
/// from its opening token onwards.
pub fn strip_selection(text: &str) -> String {
    let stripped = block_regex().replace_all(text, "");
    let visible = match stripped.find(SELECTION_OPEN) {
        Some(start) => &stripped[..start],
        None => &stripped[..],
    };
    visible.trim().to_string()
}
