//! Client for the document extraction backend.
//!
//! The backend exposes a small REST surface:
//!
//! - `POST /documents` – multipart upload with a `file` part and a `data_points` JSON text field.
//! - `GET /documents` – listing of uploaded documents.
//! - `GET /documents/{id}/datapoints` – extraction results for one document.
//! - `POST /documents/{id}/datapoints` – store extraction results for one document.

mod service;
pub mod types;

pub use service::{ApiClient, DocumentApi};
pub use types::{
    ApiError, DataPointResults, DocumentFile, DocumentList, DocumentSummary, Operation,
    UploadReceipt,
};
