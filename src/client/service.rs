//! HTTP client wrapper for the document backend.

use crate::client::types::{ApiError, DocumentFile, Operation};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Lightweight HTTP client for the document extraction backend.
///
/// Every call performs exactly one request. Success statuses yield the decoded JSON body;
/// anything else becomes [`ApiError::RequestFailed`]. The client holds no state besides the
/// base URL and a pooled `reqwest` handle, so clones can be shared freely across tasks.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

/// Abstraction over the backend operations used by front ends such as the CLI.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Upload a document together with its data point descriptors.
    async fn upload_document(
        &self,
        file: DocumentFile,
        data_points: &[Value],
    ) -> Result<Value, ApiError>;

    /// List documents known to the backend.
    async fn list_documents(&self) -> Result<Value, ApiError>;

    /// Fetch extracted data points for a document.
    async fn get_data_points(&self, document_id: &str) -> Result<Value, ApiError>;

    /// Store extraction results for a document.
    async fn update_data_points(
        &self,
        document_id: &str,
        results: &BTreeMap<String, String>,
    ) -> Result<Value, ApiError>;
}

impl ApiClient {
    /// Construct a client targeting the base URL from `config`.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("docpoint-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, &config.api_url)
    }

    /// Construct a client around an existing `reqwest` handle.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url).map_err(ApiError::InvalidUrl)?;
        tracing::debug!(url = %base_url, "Initialized document API client");
        Ok(Self { client, base_url })
    }

    /// Base URL every request is rooted at.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload `file` with `data_points` encoded as JSON text in the `data_points` form field.
    pub async fn upload_document<D, T>(
        &self,
        file: DocumentFile,
        data_points: &[D],
    ) -> Result<T, ApiError>
    where
        D: Serialize + Sync,
        T: DeserializeOwned,
    {
        let encoded = serde_json::to_string(data_points)?;
        let DocumentFile {
            file_name,
            bytes,
            mime,
        } = file;
        let byte_count = bytes.len();

        let mut part = Part::bytes(bytes).file_name(file_name.clone());
        if let Some(mime) = mime.as_deref() {
            part = part.mime_str(mime)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("data_points", encoded);

        tracing::debug!(
            file = %file_name,
            bytes = byte_count,
            data_points = data_points.len(),
            "Uploading document"
        );
        let response = self
            .request(Method::POST, "documents")
            .multipart(form)
            .send()
            .await?;

        self.decode(Operation::UploadDocument, response).await
    }

    /// Retrieve the backend's document listing.
    pub async fn list_documents<T>(&self) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.request(Method::GET, "documents").send().await?;
        self.decode(Operation::ListDocuments, response).await
    }

    /// Retrieve extracted data points for `document_id`.
    ///
    /// The identifier is placed into the path as given.
    pub async fn get_data_points<T>(&self, document_id: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, &format!("documents/{document_id}/datapoints"))
            .send()
            .await?;
        self.decode(Operation::GetDataPoints, response).await
    }

    /// Submit extraction results for `document_id` as `{"results": {...}}`.
    pub async fn update_data_points<T>(
        &self,
        document_id: &str,
        results: &BTreeMap<String, String>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, &format!("documents/{document_id}/datapoints"))
            .json(&json!({ "results": results }))
            .send()
            .await?;
        self.decode(Operation::UpdateDataPoints, response).await
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format_endpoint(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.endpoint(path);
        tracing::debug!(method = %method, url = %url, "Sending request");
        self.client.request(method, url)
    }

    async fn decode<T>(
        &self,
        operation: Operation,
        response: reqwest::Response,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        tracing::debug!(operation = ?operation, status = status.as_u16(), "Received response");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = if operation.reports_body() {
            Some(response.text().await.unwrap_or_default())
        } else {
            None
        };
        Err(ApiError::RequestFailed {
            operation,
            status,
            body,
        })
    }
}

#[async_trait]
impl DocumentApi for ApiClient {
    async fn upload_document(
        &self,
        file: DocumentFile,
        data_points: &[Value],
    ) -> Result<Value, ApiError> {
        ApiClient::upload_document(self, file, data_points).await
    }

    async fn list_documents(&self) -> Result<Value, ApiError> {
        ApiClient::list_documents(self).await
    }

    async fn get_data_points(&self, document_id: &str) -> Result<Value, ApiError> {
        ApiClient::get_data_points(self, document_id).await
    }

    async fn update_data_points(
        &self,
        document_id: &str,
        results: &BTreeMap<String, String>,
    ) -> Result<Value, ApiError> {
        ApiClient::update_data_points(self, document_id, results).await
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::{DataPointResults, DocumentList, UploadReceipt};
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use regex::Regex;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::with_client(
            Client::builder()
                .user_agent("docpoint-test")
                .build()
                .expect("client"),
            &server.base_url(),
        )
        .expect("api client")
    }

    #[test]
    fn default_config_targets_local_backend() {
        let client = ApiClient::new(&Config::default()).expect("client");
        assert_eq!(client.endpoint("documents"), "http://localhost:8080/documents");
        assert_eq!(
            client.endpoint("documents/abc123/datapoints"),
            "http://localhost:8080/documents/abc123/datapoints"
        );
    }

    #[test]
    fn base_url_path_prefix_is_preserved() {
        let client = ApiClient::with_client(Client::new(), "https://example.test/api/").expect("client");
        assert_eq!(client.endpoint("documents"), "https://example.test/api/documents");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApiClient::with_client(Client::new(), "no scheme here").expect_err("invalid url");
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn upload_sends_file_and_encoded_data_points() {
        let server = MockServer::start_async().await;
        let data_points_field =
            Regex::new(r#"name="data_points"\r\n\r\n\[\{"x":1,"y":2\}\]\r\n"#).expect("regex");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/documents")
                    .header_exists("content-type")
                    .body_contains(r#"name="file"; filename="report.pdf""#)
                    .body_contains("%PDF-1.4 payload bytes")
                    .body_matches(data_points_field);
                then.status(201)
                    .json_body(json!({ "document_id": "doc-1", "status": "pending" }));
            })
            .await;

        let client = client_for(&server);
        let receipt: UploadReceipt = client
            .upload_document(
                DocumentFile::new("report.pdf", b"%PDF-1.4 payload bytes".to_vec()),
                &[json!({ "x": 1, "y": 2 })],
            )
            .await
            .expect("upload");

        mock.assert_async().await;
        assert_eq!(receipt.document_id, "doc-1");
        assert_eq!(receipt.status, "pending");
    }

    #[tokio::test]
    async fn upload_applies_mime_type_to_file_part() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/documents")
                    .body_contains("Content-Type: application/pdf")
                    .body_contains(r#"["invoice_total","due_date"]"#);
                then.status(201).json_body(json!({ "document_id": "doc-2" }));
            })
            .await;

        let client = client_for(&server);
        let value: Value = client
            .upload_document(
                DocumentFile::new("invoice.pdf", b"%PDF".to_vec()).with_mime("application/pdf"),
                &["invoice_total", "due_date"],
            )
            .await
            .expect("upload");

        mock.assert_async().await;
        assert_eq!(value, json!({ "document_id": "doc-2" }));
    }

    #[tokio::test]
    async fn upload_failure_reports_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/documents");
                then.status(500).body("disk full");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .upload_document::<_, Value>(DocumentFile::new("a.pdf", b"a".to_vec()), &[json!({})])
            .await
            .expect_err("upload should fail");

        assert_eq!(err.to_string(), "Upload failed: 500 disk full");
        assert_eq!(err.status().map(|status| status.as_u16()), Some(500));
    }

    #[tokio::test]
    async fn list_documents_returns_parsed_body() {
        let server = MockServer::start_async().await;
        let body = json!({
            "documents": [
                { "document_id": "doc-1", "filename": "a.pdf", "status": "completed" }
            ]
        });
        let mock = server
            .mock_async({
                let body = body.clone();
                move |when, then| {
                    when.method(GET).path("/documents");
                    then.status(200).json_body(body);
                }
            })
            .await;

        let client = client_for(&server);
        let value: Value = client.list_documents().await.expect("list");
        assert_eq!(value, body);

        let typed: DocumentList = client.list_documents().await.expect("typed list");
        assert_eq!(typed.documents[0].filename, "a.pdf");
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn list_documents_failure_omits_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/documents");
                then.status(503).body("maintenance");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .list_documents::<Value>()
            .await
            .expect_err("list should fail");
        assert_eq!(err.to_string(), "Failed to list documents: 503");
    }

    #[tokio::test]
    async fn get_data_points_hits_document_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/documents/abc123/datapoints");
                then.status(200).json_body(json!({
                    "document_id": "abc123",
                    "status": "completed",
                    "results": { "invoice_total": "1200.00" }
                }));
            })
            .await;

        let client = client_for(&server);
        let results: DataPointResults = client.get_data_points("abc123").await.expect("results");

        mock.assert_async().await;
        assert_eq!(results.document_id, "abc123");
        assert_eq!(
            results.results.get("invoice_total").map(String::as_str),
            Some("1200.00")
        );
    }

    #[tokio::test]
    async fn get_data_points_failure_contains_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/documents/missing/datapoints");
                then.status(404).body("document missing not found");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .get_data_points::<Value>("missing")
            .await
            .expect_err("lookup should fail");
        assert_eq!(err.to_string(), "Failed to get data points: 404");
    }

    #[tokio::test]
    async fn update_data_points_posts_results_object() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/documents/doc-9/datapoints")
                    .json_body(json!({ "results": { "due_date": "2024-05-01" } }));
                then.status(200).json_body(json!({ "status": "updated" }));
            })
            .await;

        let client = client_for(&server);
        let results = BTreeMap::from([("due_date".to_string(), "2024-05-01".to_string())]);
        let value: Value = client
            .update_data_points("doc-9", &results)
            .await
            .expect("update");

        mock.assert_async().await;
        assert_eq!(value["status"], "updated");
    }

    #[tokio::test]
    async fn success_with_invalid_json_is_a_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/documents");
                then.status(200).body("not json");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .list_documents::<Value>()
            .await
            .expect_err("decode should fail");
        assert!(matches!(err, ApiError::Http(ref inner) if inner.is_decode()));
    }
}
