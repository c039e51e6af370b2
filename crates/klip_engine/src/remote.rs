use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;

use crate::{AckRequest, Article};

/// Article body, delivered chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RemoteError>> + Send>>;

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub connect_timeout: Duration,
    /// Total bound for the pending-list request.
    pub request_timeout: Duration,
    /// Longest silence tolerated between body reads. Article downloads have
    /// no total bound and only stall out.
    pub read_timeout: Duration,
    /// Total bound for the acknowledgment request.
    pub ack_timeout: Duration,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            ack_timeout: Duration::from_secs(5),
        }
    }
}

/// Server-side call that failed with an unexpected status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListPending,
    Acknowledge,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListPending => write!(f, "sync"),
            Operation::Acknowledge => write!(f, "delete downloaded articles"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("received non ok status code while trying to {operation}: {status}")]
    Status { operation: Operation, status: u16 },
    #[error("received {status} status while trying to download to {}", path.display())]
    FetchStatus { status: u16, path: PathBuf },
    #[error("failed to decode pending articles: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode acknowledgment: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Transport towards the klip server. Carries no sync logic.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    /// `GET {server_url}/sync`.
    async fn list_pending(&self) -> Result<Vec<Article>, RemoteError>;

    /// `GET {url}`. `local_path` is only used to describe failures.
    async fn fetch_bytes(&self, url: &str, local_path: &Path) -> Result<ByteStream, RemoteError>;

    /// `POST {server_url}/clips/batch-delete`. All or nothing.
    async fn acknowledge_batch(&self, filenames: &[String]) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestRemoteClient {
    server_url: String,
    settings: RemoteSettings,
    client: reqwest::Client,
}

impl ReqwestRemoteClient {
    pub fn new(server_url: impl Into<String>, settings: RemoteSettings) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()
            .map_err(|err| RemoteError::Client(err.to_string()))?;
        Ok(Self {
            server_url: server_url.into(),
            settings,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }
}

#[async_trait::async_trait]
impl RemoteClient for ReqwestRemoteClient {
    async fn list_pending(&self) -> Result<Vec<Article>, RemoteError> {
        let url = self.endpoint("/sync");
        let response = self
            .client
            .get(&url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, &url))?;

        if response.status() != StatusCode::OK {
            return Err(RemoteError::Status {
                operation: Operation::ListPending,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| map_reqwest_error(err, &url))?;
        // A JSON `null` body means the queue is empty.
        let articles: Option<Vec<Article>> =
            serde_json::from_slice(&body).map_err(RemoteError::Decode)?;
        Ok(articles.unwrap_or_default())
    }

    async fn fetch_bytes(&self, url: &str, local_path: &Path) -> Result<ByteStream, RemoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, url))?;

        if response.status() != StatusCode::OK {
            return Err(RemoteError::FetchStatus {
                status: response.status().as_u16(),
                path: local_path.to_path_buf(),
            });
        }

        let url = url.to_string();
        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|err| map_reqwest_error(err, &url)));
        Ok(Box::pin(stream))
    }

    async fn acknowledge_batch(&self, filenames: &[String]) -> Result<(), RemoteError> {
        let url = self.endpoint("/clips/batch-delete");
        let payload = serde_json::to_vec(&AckRequest {
            filenames: filenames.to_vec(),
        })
        .map_err(RemoteError::Encode)?;

        let response = self
            .client
            .post(&url)
            .timeout(self.settings.ack_timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, &url))?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(RemoteError::Status {
                operation: Operation::Acknowledge,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error, url: &str) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::Timeout {
            url: url.to_string(),
        };
    }
    RemoteError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
