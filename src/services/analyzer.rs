// src/services/analyzer.rs

//! Content-analysis client.
//!
//! Builds the multi-part `generateContent` request from raw text and page
//! images, sends it, and turns the reply into a normalized preview.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AnalyzerConfig, PreviewBook};
use crate::services::normalizer::normalize_preview;
use crate::utils::http::{create_async_client, json_body};
use crate::utils::message::{first_message, string_at};
use crate::utils::parse_data_url;

/// Instruction block sent ahead of the user's content.
pub const ANALYSIS_PROMPT: &str = "\
You receive book content (full book or a single chapter).
Return STRICTLY JSON with this exact schema:
{
  \"bookTitle\": string,
  \"chapters\": [
    {
      \"chapterTitle\": string,
      \"lessons\": [
        { \"type\": \"vocabulary\"|\"grammar\"|\"listening\"|\"speaking\"|\"reading\"|\"writing\", \"items\": string[] }
      ]
    }
  ]
}
No markdown or commentary. Only JSON. If single chapter, infer bookTitle or set \"Unknown\".";

pub const MSG_NO_INPUT: &str = "Provide text or images to analyze.";
pub const MSG_SERVICE_FAILED: &str = "Failed to analyze with Gemini.";
pub const MSG_NO_CONTENT: &str = "Gemini did not return any content.";
pub const MSG_NO_JSON: &str = "Gemini response did not include valid JSON payload.";
pub const MSG_INVALID_JSON: &str = "Gemini response was not valid JSON.";
pub const MSG_MISSING_FIELDS: &str = "Gemini response was missing required fields.";

/// Raw material for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisInput {
    pub raw_text: Option<String>,
    /// Page images as data-URLs (or bare base64)
    pub images: Vec<String>,
}

impl AnalysisInput {
    /// Raw text, when it has non-whitespace content.
    pub fn text(&self) -> Option<&str> {
        self.raw_text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Whether there is nothing to analyze.
    pub fn is_empty(&self) -> bool {
        self.text().is_none() && self.images.is_empty()
    }
}

/// Request body of a `generateContent` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlinePart,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlinePart {
    pub mime_type: String,
    pub data: String,
}

/// Compose the request for `input`.
///
/// Parts are ordered: instruction, raw text, then one inline part per image.
/// Images with an empty payload are skipped.
pub fn build_request(input: &AnalysisInput) -> Result<GenerateRequest> {
    if input.is_empty() {
        return Err(AppError::validation(MSG_NO_INPUT));
    }

    let mut parts = vec![Part::Text {
        text: ANALYSIS_PROMPT.to_string(),
    }];

    if let Some(text) = input.text() {
        parts.push(Part::Text {
            text: text.to_string(),
        });
    }

    for image in &input.images {
        let inline = parse_data_url(image);
        if inline.data.is_empty() {
            continue;
        }
        parts.push(Part::Inline {
            inline_data: InlinePart {
                mime_type: inline.mime_type,
                data: inline.data,
            },
        });
    }

    Ok(GenerateRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
    })
}

/// Concatenate every text fragment of every candidate, in order.
pub fn extract_text(body: &Value) -> String {
    body.get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.pointer("/content/parts"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

fn fence_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)```json|```").ok())
        .as_ref()
}

/// Remove Markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    match fence_pattern() {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Turn a successful reply body into a preview.
pub fn parse_reply(body: &Value) -> Result<PreviewBook> {
    let combined = extract_text(body);
    if combined.trim().is_empty() {
        return Err(AppError::empty_response(MSG_NO_CONTENT));
    }

    let sanitized = strip_code_fences(&combined);
    if sanitized.is_empty() {
        return Err(AppError::empty_response(MSG_NO_JSON));
    }

    let parsed: Value = serde_json::from_str(&sanitized).map_err(|e| {
        log::debug!("Reply JSON parse failed: {}", e);
        AppError::malformed_payload(MSG_INVALID_JSON)
    })?;

    let book = normalize_preview(&parsed);
    if !book.has_title() {
        return Err(AppError::incomplete_payload(MSG_MISSING_FIELDS));
    }
    Ok(book)
}

/// Message for a non-success reply: the service's own, else a generic one.
pub fn service_error_message(body: Option<&Value>) -> String {
    first_message([string_at(body, &["error", "message"])], MSG_SERVICE_FAILED)
}

/// Anything that can turn import material into a preview.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput) -> Result<PreviewBook>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiAnalyzer {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiAnalyzer {
    /// Create an analyzer with an explicit API key.
    pub fn new(config: &AnalyzerConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: create_async_client(&config.user_agent, config.timeout_secs)?,
            endpoint: Url::parse(&config.endpoint)?,
            api_key: api_key.into(),
        })
    }

    /// Create an analyzer taking the API key from the environment.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        Self::new(config, config.api_key()?)
    }
}

#[async_trait]
impl ContentAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, input: &AnalysisInput) -> Result<PreviewBook> {
        let request = build_request(input)?;
        let part_count = request.contents.iter().map(|c| c.parts.len()).sum::<usize>();
        log::debug!(
            "Sending {} parts to {}",
            part_count,
            self.endpoint.path()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service(first_message(
                    [Some(e.without_url().to_string())],
                    MSG_SERVICE_FAILED,
                ))
            })?;

        let status = response.status();
        let body = json_body(response).await;

        if !status.is_success() {
            let message = service_error_message(body.as_ref());
            log::warn!("Analysis failed with status {}: {}", status, message);
            return Err(AppError::external_service(message));
        }

        let book = parse_reply(&body.unwrap_or(Value::Null))?;
        let stats = book.stats();
        log::info!(
            "Analysis produced \"{}\": {} chapters, {} lessons, {} items",
            book.book_title,
            stats.chapters,
            stats.lessons,
            stats.items
        );
        Ok(book)
    }
}
