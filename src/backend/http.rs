//! HTTP backend client.
//!
//! Talks JSON to the translation/execution service with reqwest. Error
//! bodies arrive with 4xx/5xx statuses, so the body is decoded regardless of
//! the status code.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::wire::{
    ExecuteRequestBody, ExecuteResponseBody, TranslateRequestBody, TranslateResponseBody,
};
use super::{
    BackendClient, ExecuteReply, TranslateReply, TransportError, EXECUTE_PATH, TRANSLATE_PATH,
};
use crate::config::BackendConfig;
use crate::error::{QueryChatError, Result};
use crate::model::QueryRequest;

/// Backend client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: Client,
}

impl HttpBackend {
    /// Creates a client for the configured backend.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = config.parsed_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QueryChatError::backend(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::Request(format!("invalid endpoint {path}: {e}")))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "Backend request");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_request_error)?;
        debug!(%status, bytes = text.len(), "Backend response");

        serde_json::from_str(&text)
            .map_err(|e| TransportError::Malformed(format!("status {status}: {e}")))
    }
}

fn map_request_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_decode() {
        TransportError::Malformed(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn translate(&self, text: &str) -> std::result::Result<TranslateReply, TransportError> {
        let body: TranslateResponseBody = self
            .post_json(TRANSLATE_PATH, &TranslateRequestBody { message: text })
            .await?;
        body.into_reply()
    }

    async fn execute(
        &self,
        request: &QueryRequest,
    ) -> std::result::Result<ExecuteReply, TransportError> {
        let body: ExecuteResponseBody = self
            .post_json(EXECUTE_PATH, &ExecuteRequestBody::from(request))
            .await?;
        body.into_reply()
    }
}
