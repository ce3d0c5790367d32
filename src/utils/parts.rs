//! Utility functions for working with [`Part`] lists.
//!
//! There are two text extractors here and they intentionally disagree:
//! [`extract_final_text`] keeps only the last text part of a unary response,
//! while [`stream_text`] concatenates every text part of a streamed frame.

use crate::types::{Content, FunctionCall, FunctionResponse, Part};

/// Returns the text of the *last* non-thought text part, or `""` if none.
///
/// Used on the final event of a unary `/run` call, where earlier text parts
/// are intermediate output and only the last one is the answer.
///
/// # Example
///
/// ```
/// use adk_client::types::Part;
/// use adk_client::utils::extract_final_text;
///
/// let parts = vec![
///     Part::text("a"),
///     Part::Thought { text: None },
///     Part::text("b"),
/// ];
/// assert_eq!(extract_final_text(&parts), "b");
/// ```
pub fn extract_final_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(Part::as_text)
        .filter(|text| !text.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

/// Concatenates, in order, the text of every non-thought text part.
///
/// # Example
///
/// ```
/// use adk_client::types::Part;
/// use adk_client::utils::stream_text;
///
/// let parts = vec![
///     Part::text("a"),
///     Part::Thought { text: Some("thinking".into()) },
///     Part::text("b"),
/// ];
/// assert_eq!(stream_text(&parts), "ab");
/// ```
pub fn stream_text(parts: &[Part]) -> String {
    parts.iter().filter_map(Part::as_text).collect()
}

/// Returns `true` if any part is a non-empty, non-thought text part.
pub fn has_text(parts: &[Part]) -> bool {
    parts
        .iter()
        .filter_map(Part::as_text)
        .any(|text| !text.is_empty())
}

/// First function call among the parts.
pub fn first_function_call(parts: &[Part]) -> Option<&FunctionCall> {
    parts.iter().find_map(|part| match part {
        Part::FunctionCall(call) => Some(call),
        _ => None,
    })
}

/// First function response among the parts.
pub fn first_function_response(parts: &[Part]) -> Option<&FunctionResponse> {
    parts.iter().find_map(|part| match part {
        Part::FunctionResponse(resp) => Some(resp),
        _ => None,
    })
}

/// Wraps plain text as a single user-role text part.
pub fn build_content(text: &str) -> Content {
    Content::user_text(text)
}
