//! Typed HTTP client for the Baketsu REST API.
//!
//! Credentials are passed with every call instead of being held by the
//! client, so one client can serve several accounts.

pub mod schema;

pub use schema::{
    BreadcrumbData, CategoryData, DeletedData, FileCostData, FileData, FolderData,
    FolderDetailData, InvoiceData, PricingData, ReconciliationData, RegisterFile, Schema,
    StorageData, UsageData,
};

use reqwest::{header::CONTENT_TYPE, Client, Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::billing::UsagePeriod;
use crate::file::{FileQuery, FileSort, FileUpdate, FolderScope};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total timeout in seconds.
const TOTAL_TIMEOUT_SECS: u64 = 30;

/// User agent string for API requests.
const USER_AGENT: &str = "baketsu-client/0.1";

/// Errors raised by the API client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The base URL or a derived URL is invalid.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    /// The body did not match the expected schema.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl ClientError {
    /// Whether the caller can keep going, for example by showing stale data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ClientError::MalformedPayload(_))
    }

    /// HTTP status of the failure, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Bearer credentials for one request.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    /// Credentials from an access token issued by the auth service.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// REST API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { client, base })
    }

    /// Month-to-date usage.
    pub async fn usage(&self, creds: &Credentials) -> Result<UsageData, ClientError> {
        let url = self.url("api/billing/usage")?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Effective pricing.
    pub async fn pricing(&self, creds: &Credentials) -> Result<PricingData, ClientError> {
        let url = self.url("api/billing/pricing")?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Latest invoices, newest first.
    pub async fn invoices(&self, creds: &Credentials) -> Result<Vec<InvoiceData>, ClientError> {
        let url = self.url("api/billing/invoices")?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Generate an invoice; `None` bills the previous month.
    pub async fn generate_invoice(
        &self,
        creds: &Credentials,
        period: Option<UsagePeriod>,
    ) -> Result<InvoiceData, ClientError> {
        let mut url = self.url("api/billing/invoices")?;
        if let Some(period) = period {
            url.query_pairs_mut()
                .append_pair("year", &period.year().to_string())
                .append_pair("month", &period.month().to_string());
        }
        self.send(Method::POST, url, creds, None::<&()>).await
    }

    /// Invoice detail.
    pub async fn invoice(&self, creds: &Credentials, id: i64) -> Result<InvoiceData, ClientError> {
        let url = self.url(&format!("api/billing/invoices/{id}"))?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Compare an invoice with a fresh recomputation.
    pub async fn reconcile_invoice(
        &self,
        creds: &Credentials,
        id: i64,
    ) -> Result<ReconciliationData, ClientError> {
        let url = self.url(&format!("api/billing/invoices/{id}/reconcile"))?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Delete an unpaid invoice.
    pub async fn delete_invoice(
        &self,
        creds: &Credentials,
        id: i64,
    ) -> Result<DeletedData, ClientError> {
        let url = self.url(&format!("api/billing/invoices/{id}"))?;
        self.send(Method::DELETE, url, creds, None::<&()>).await
    }

    /// List active files.
    pub async fn files(
        &self,
        creds: &Credentials,
        query: &FileQuery,
    ) -> Result<Vec<FileData>, ClientError> {
        let mut url = self.url("api/files")?;
        {
            let mut pairs = url.query_pairs_mut();
            match query.scope {
                FolderScope::All => {}
                FolderScope::Root => {
                    pairs.append_pair("root", "true");
                }
                FolderScope::Folder(id) => {
                    pairs.append_pair("folder_id", &id.to_string());
                }
            }
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
            pairs.append_pair("sort", sort_key(query.sort));
            pairs.append_pair("order", if query.descending { "desc" } else { "asc" });
        }
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// File detail.
    pub async fn file(&self, creds: &Credentials, id: i64) -> Result<FileData, ClientError> {
        let url = self.url(&format!("api/files/{id}"))?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Register an uploaded file.
    pub async fn register_file(
        &self,
        creds: &Credentials,
        file: &RegisterFile,
    ) -> Result<FileData, ClientError> {
        let url = self.url("api/files")?;
        self.send(Method::POST, url, creds, Some(file)).await
    }

    /// Rename and/or move a file.
    pub async fn update_file(
        &self,
        creds: &Credentials,
        id: i64,
        update: &FileUpdate,
    ) -> Result<FileData, ClientError> {
        let mut body = serde_json::Map::new();
        if let Some(filename) = &update.filename {
            body.insert("filename".to_string(), filename.clone().into());
        }
        if let Some(folder_id) = update.folder_id {
            body.insert("folder_id".to_string(), folder_id.into());
        }

        let url = self.url(&format!("api/files/{id}"))?;
        self.send(Method::PATCH, url, creds, Some(&body)).await
    }

    /// Delete a file.
    pub async fn delete_file(
        &self,
        creds: &Credentials,
        id: i64,
    ) -> Result<DeletedData, ClientError> {
        let url = self.url(&format!("api/files/{id}"))?;
        self.send(Method::DELETE, url, creds, None::<&()>).await
    }

    /// List root folders, or the children of `parent_id`.
    pub async fn folders(
        &self,
        creds: &Credentials,
        parent_id: Option<i64>,
    ) -> Result<Vec<FolderData>, ClientError> {
        let mut url = self.url("api/folders")?;
        if let Some(parent_id) = parent_id {
            url.query_pairs_mut()
                .append_pair("parent_id", &parent_id.to_string());
        }
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        creds: &Credentials,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<FolderData, ClientError> {
        let body = serde_json::json!({ "name": name, "parent_id": parent_id });
        let url = self.url("api/folders")?;
        self.send(Method::POST, url, creds, Some(&body)).await
    }

    /// Folder detail with breadcrumb.
    pub async fn folder(
        &self,
        creds: &Credentials,
        id: i64,
    ) -> Result<FolderDetailData, ClientError> {
        let url = self.url(&format!("api/folders/{id}"))?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    /// Storage breakdown.
    pub async fn storage(&self, creds: &Credentials) -> Result<StorageData, ClientError> {
        let url = self.url("api/storage")?;
        self.send(Method::GET, url, creds, None::<&()>).await
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    async fn send<T: Schema, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        creds: &Credentials,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&creds.token);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ClientError::MalformedPayload(e.to_string()))?;
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error = serde_json::from_slice::<schema::ErrorEnvelope>(&bytes).ok();
            return Err(ClientError::Http {
                status,
                code: error.as_ref().map(|e| e.error.code.clone()),
                message: error
                    .map(|e| e.error.message)
                    .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned()),
            });
        }

        schema::decode(&bytes).map_err(|e| {
            tracing::warn!(%status, "Rejected API payload: {}", e);
            ClientError::MalformedPayload(e)
        })
    }
}

fn sort_key(sort: FileSort) -> &'static str {
    match sort {
        FileSort::UploadedAt => "uploaded_at",
        FileSort::Name => "name",
        FileSort::Size => "size",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/storage").unwrap();
        assert_eq!(
            client.url("api/files").unwrap().as_str(),
            "http://localhost:8080/storage/api/files"
        );

        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.url("api/storage").unwrap().as_str(),
            "http://localhost:8080/api/storage"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }

    #[test]
    fn test_error_recoverability() {
        assert!(ClientError::MalformedPayload("x".to_string()).is_recoverable());
        let http = ClientError::Http {
            status: StatusCode::NOT_FOUND,
            code: Some("NOT_FOUND".to_string()),
            message: "File not found".to_string(),
        };
        assert!(!http.is_recoverable());
        assert_eq!(http.status(), Some(StatusCode::NOT_FOUND));
    }
}
