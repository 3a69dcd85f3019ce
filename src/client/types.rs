//! Shared types used by the document API client.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors returned while talking to the document backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before a usable response was received, or the body was not valid JSON.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Data point descriptors could not be encoded as JSON text.
    #[error("Failed to encode data points: {0}")]
    Encode(#[from] serde_json::Error),
    /// Upload source could not be read from disk.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Backend answered with a status outside the success range.
    #[error("{operation}: {}{}", .status.as_u16(), body_suffix(.body))]
    RequestFailed {
        /// Operation that was attempted.
        operation: Operation,
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Response text, captured for uploads only.
        body: Option<String>,
    },
}

impl ApiError {
    /// HTTP status of a failed request, when the backend produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|text| format!(" {text}"))
        .unwrap_or_default()
}

/// Backend operations exposed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /documents`
    UploadDocument,
    /// `GET /documents`
    ListDocuments,
    /// `GET /documents/{id}/datapoints`
    GetDataPoints,
    /// `POST /documents/{id}/datapoints`
    UpdateDataPoints,
}

impl Operation {
    /// Whether failures of this operation carry the response text in their message.
    pub(crate) const fn reports_body(self) -> bool {
        matches!(self, Self::UploadDocument)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UploadDocument => "Upload failed",
            Self::ListDocuments => "Failed to list documents",
            Self::GetDataPoints => "Failed to get data points",
            Self::UpdateDataPoints => "Failed to update data points",
        };
        f.write_str(label)
    }
}

/// Binary document sent in the `file` field of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    /// File name reported to the backend.
    pub file_name: String,
    /// Raw file contents, transmitted unchanged.
    pub bytes: Vec<u8>,
    /// Optional MIME type for the part; the transport default applies when absent.
    pub mime: Option<String>,
}

impl DocumentFile {
    /// Wrap in-memory bytes under the given file name.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    /// Attach a MIME type to the part.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a document from disk, naming it after the final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// Acknowledgement returned by `POST /documents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    /// Identifier assigned by the backend.
    #[serde(default)]
    pub document_id: String,
    /// Processing status at acceptance time.
    #[serde(default)]
    pub status: String,
}

/// Response body of `GET /documents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentList {
    /// Documents known to the backend.
    #[serde(default)]
    pub documents: Vec<DocumentSummary>,
}

/// One entry of the document listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentSummary {
    /// Identifier assigned by the backend.
    #[serde(default)]
    pub document_id: String,
    /// Original file name supplied at upload.
    #[serde(default)]
    pub filename: String,
    /// Processing status (`pending`, `processing`, `completed`, ...).
    #[serde(default)]
    pub status: String,
}

/// Response body of `GET /documents/{id}/datapoints`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DataPointResults {
    /// Document the results belong to.
    #[serde(default)]
    pub document_id: String,
    /// Processing status of the document.
    #[serde(default)]
    pub status: String,
    /// Extracted value per requested data point.
    #[serde(default)]
    pub results: BTreeMap<String, String>,
}
