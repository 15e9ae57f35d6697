// src/services/submitter.rs

//! Backend import submission.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BackendConfig, PreviewBook};
use crate::utils::http::{USER_AGENT, create_async_client, json_body};
use crate::utils::message::{first_message, string_at};

pub const MSG_NO_PREVIEW: &str = "No preview available to save.";
pub const MSG_SAVE_FALLBACK: &str =
    "Unable to save the book import. The backend endpoint may not be available yet.";

/// Anything that can commit a finished preview.
#[async_trait]
pub trait PreviewSubmitter: Send + Sync {
    async fn submit(&self, preview: &PreviewBook) -> Result<()>;
}

/// Client for `POST /api/books/import`.
pub struct BackendSubmitter {
    client: Client,
    import_url: Url,
    token: Option<String>,
}

impl BackendSubmitter {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(USER_AGENT, config.timeout_secs)?,
            import_url: config.import_url()?,
            token: config.token(),
        })
    }

    /// Replace the bearer token taken from the environment.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn import_url(&self) -> &Url {
        &self.import_url
    }
}

/// Message for a failed save, most specific source first.
pub fn persistence_message(
    body: Option<&serde_json::Value>,
    transport: Option<String>,
) -> String {
    first_message(
        [
            string_at(body, &["message"]),
            string_at(body, &["detail"]),
            transport,
        ],
        MSG_SAVE_FALLBACK,
    )
}

#[async_trait]
impl PreviewSubmitter for BackendSubmitter {
    async fn submit(&self, preview: &PreviewBook) -> Result<()> {
        let mut request = self.client.post(self.import_url.clone()).json(preview);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = persistence_message(None, Some(e.to_string()));
                log::warn!("Import submit failed: {}", message);
                return Err(AppError::persistence(message));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = json_body(response).await;
            let transport = Some(format!("Request failed with status code {}", status.as_u16()));
            let message = persistence_message(body.as_ref(), transport);
            log::warn!("Import submit rejected ({}): {}", status, message);
            return Err(AppError::persistence(message));
        }

        log::info!(
            "Submitted \"{}\" with {} chapters to {}",
            preview.book_title,
            preview.chapters.len(),
            self.import_url
        );
        Ok(())
    }
}
