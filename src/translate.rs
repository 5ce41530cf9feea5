//! Natural-language to SQL translation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{BackendClient, TranslateReply};
use crate::error::ErrorReport;
use crate::model::QueryRequest;

/// Turns user text into a [`QueryRequest`] through the backend.
#[derive(Clone)]
pub struct TranslationClient {
    backend: Arc<dyn BackendClient>,
}

impl TranslationClient {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    /// Translates `text` into a query, carrying the backend's visualization
    /// hint when it supplied one.
    ///
    /// Backend rejections become [`ErrorKind::Translation`] reports with the
    /// attempts trail untouched. Transport failures become
    /// [`ErrorKind::Network`] reports.
    ///
    /// [`ErrorKind::Translation`]: crate::error::ErrorKind::Translation
    /// [`ErrorKind::Network`]: crate::error::ErrorKind::Network
    pub async fn translate(&self, text: &str) -> Result<QueryRequest, ErrorReport> {
        debug!(chars = text.len(), "Requesting translation");

        let reply = self.backend.translate(text).await.map_err(|e| {
            warn!(error = %e, "Translation request failed");
            ErrorReport::network(e.to_string())
        })?;

        match reply {
            TranslateReply::Translated {
                query,
                visualization_hint,
            } => {
                let request = QueryRequest::new(query)
                    .map_err(|_| ErrorReport::translation("backend returned an empty query"))?;
                debug!(sql = %request.sql(), hinted = visualization_hint.is_some(), "Translated");
                Ok(request.with_hint(visualization_hint))
            }
            TranslateReply::Rejected { error, attempts } => {
                debug!(attempts = attempts.len(), "Translation rejected: {error}");
                Err(ErrorReport::translation(error).with_attempts(attempts))
            }
        }
    }
}
