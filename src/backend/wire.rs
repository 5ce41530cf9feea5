//! JSON bodies exchanged with the backend.
//!
//! Responses are decoded leniently into one struct per endpoint and then
//! narrowed into a reply enum; a body that is neither a success nor an error
//! shape is reported as malformed.

use serde::{Deserialize, Serialize};

use super::{ExecuteReply, TranslateReply, TransportError};
use crate::model::{QueryRequest, QueryResult, Row, VisualizationSpec};

/// Body of `POST /translate_to_sql`.
#[derive(Debug, Serialize)]
pub struct TranslateRequestBody<'a> {
    pub message: &'a str,
}

/// Body of `POST /execute_query`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequestBody<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_hint: Option<&'a VisualizationSpec>,
}

impl<'a> From<&'a QueryRequest> for ExecuteRequestBody<'a> {
    fn from(request: &'a QueryRequest) -> Self {
        Self {
            query: request.sql(),
            visualization_hint: request.visualization_hint(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponseBody {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub visualization_hint: Option<VisualizationSpec>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub attempts: Vec<String>,
}

impl TranslateResponseBody {
    /// Narrows the body into a reply. An `error` field wins over a query.
    pub fn into_reply(self) -> Result<TranslateReply, TransportError> {
        if let Some(error) = self.error {
            return Ok(TranslateReply::Rejected {
                error,
                attempts: self.attempts,
            });
        }
        match self.query {
            Some(query) => Ok(TranslateReply::Translated {
                query,
                visualization_hint: self.visualization_hint,
            }),
            None => Err(TransportError::Malformed(
                "response has neither `query` nor `error`".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponseBody {
    #[serde(default)]
    pub rows: Option<Vec<Row>>,
    #[serde(default)]
    pub visualization_markup: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub attempts: Vec<String>,
}

impl ExecuteResponseBody {
    /// Narrows the body into a reply. Rows sent alongside an error are kept
    /// as partial rows.
    pub fn into_reply(self) -> Result<ExecuteReply, TransportError> {
        if let Some(error) = self.error {
            return Ok(ExecuteReply::Rejected {
                error,
                attempts: self.attempts,
                partial_rows: self.rows.unwrap_or_default(),
            });
        }
        match self.rows {
            Some(rows) => Ok(ExecuteReply::Rows(QueryResult {
                rows,
                visualization_markup: self.visualization_markup,
                summary: self.summary,
                analysis: self.analysis,
            })),
            None => Err(TransportError::Malformed(
                "response has neither `rows` nor `error`".to_string(),
            )),
        }
    }
}
