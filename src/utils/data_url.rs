// src/utils/data_url.rs

//! Base64 data-URL helpers.

use std::sync::OnceLock;

use base64::{Engine as _, engine::general_purpose};
use regex::Regex;

/// MIME type assumed when a data-URL does not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// An image payload split into its MIME type and base64 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

fn data_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)^data:(.*?);base64,(.*)$").ok())
        .as_ref()
}

/// Split `data:<mime>;base64,<payload>` into its parts.
///
/// Anything else is taken as a bare base64 payload of type `image/png`.
pub fn parse_data_url(data_url: &str) -> InlineData {
    if let Some(caps) = data_url_pattern().and_then(|re| re.captures(data_url)) {
        let mime_type = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        let data = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return InlineData {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        };
    }

    InlineData {
        mime_type: DEFAULT_IMAGE_MIME.to_string(),
        data: data_url.to_string(),
    }
}

/// Encode raw bytes as a base64 data-URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}
