// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Response;
use serde_json::Value;

use crate::error::Result;

/// User-Agent sent when the configuration does not name one.
pub const USER_AGENT: &str = concat!("book-import/", env!("CARGO_PKG_VERSION"));

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Read a response body as JSON, yielding `None` when it is not JSON.
pub async fn json_body(response: Response) -> Option<Value> {
    let text = response.text().await.ok()?;
    serde_json::from_str(&text).ok()
}
