use serde::{Deserialize, Serialize};

/// One pending remote item as listed by `GET {server_url}/sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub filename: String,
    pub download_url: String,
}

impl Article {
    pub fn new(filename: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            download_url: download_url.into(),
        }
    }
}

/// Body of `POST {server_url}/clips/batch-delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRequest {
    pub filenames: Vec<String>,
}
