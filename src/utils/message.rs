// src/utils/message.rs

//! Ordered fallback for user-facing error messages.

use serde_json::Value;

/// First candidate that holds non-blank text, else `fallback`.
///
/// Candidates are consulted strictly in order.
pub fn first_message<I, S>(candidates: I, fallback: &str) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|m| !m.as_ref().trim().is_empty())
        .map(|m| m.as_ref().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// String found by following `path` through nested objects.
pub fn string_at(body: Option<&Value>, path: &[&str]) -> Option<String> {
    let mut current = body?;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(str::to_string)
}
