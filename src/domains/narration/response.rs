use serde::{Deserialize, Serialize};

pub const DEFAULT_FAILURE_TEXT: &str = "Failed to fetch or parse game state.";

const DETAILS_MARKER: &str = "Here are the details:";
const PROMPT_ECHO_MARKER: &str = "write a short scene";

/// What the response slot shows after a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    WriteFailureText,
    /// Leave whatever the slot held before (possibly stale).
    RetainPrevious,
}

pub fn trim_response(text: &str) -> String {
    text.trim().to_string()
}

/// Strips the preamble some models echo before the answer and anything from a
/// repeated prompt onwards.
pub fn clean_response(raw: &str) -> String {
    let start = raw
        .find(DETAILS_MARKER)
        .map(|i| i + DETAILS_MARKER.len())
        .unwrap_or(0);
    let rest = &raw[start..];
    // ASCII lowercase keeps byte offsets aligned with `rest`.
    let end = rest
        .to_ascii_lowercase()
        .find(PROMPT_ECHO_MARKER)
        .unwrap_or(rest.len());
    rest[..end].trim().to_string()
}
