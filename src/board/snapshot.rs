//! Initial board contents.
//!
//! The snapshot is trusted as loaded: positions outside the current clamp
//! rectangle are kept and only corrected by the next drag.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{ApiConfig, SizesConfig};
use crate::sync::Credentials;

use super::models::{MemoRecord, MovableItem};
use super::store::BoardStateStore;

/// Memos as returned by the board endpoint.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub memos: Vec<MemoRecord>,
}

/// The backend serves either a bare array or a `{code, message, data}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotBody {
    Bare(Vec<MemoRecord>),
    Envelope { data: Vec<MemoRecord> },
}

impl BoardSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        let body: SnapshotBody =
            serde_json::from_str(json).context("Failed to parse board snapshot")?;
        let memos = match body {
            SnapshotBody::Bare(memos) => memos,
            SnapshotBody::Envelope { data } => data,
        };
        Ok(Self { memos })
    }

    /// Live (non-archived) memos as board items, sized by style.
    pub fn into_items(self, sizes: &SizesConfig) -> Vec<MovableItem> {
        self.memos
            .into_iter()
            .filter(|memo| !memo.is_archived)
            .map(|memo| {
                let size = sizes.size_for(memo.style_code());
                memo.into_item(size)
            })
            .collect()
    }

    pub fn into_store(self, sizes: &SizesConfig) -> BoardStateStore {
        BoardStateStore::from_items(self.into_items(sizes))
    }
}

/// Source of the initial board contents.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn load(&self) -> Result<BoardSnapshot>;
}

/// Reads a snapshot saved as JSON on disk.
pub struct FileSnapshotSource {
    pub path: PathBuf,
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn load(&self) -> Result<BoardSnapshot> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot at {}", self.path.display()))?;
        BoardSnapshot::from_json(&content)
    }
}

/// Fetches `GET /api/memos` from the backend.
pub struct HttpSnapshotSource {
    http: reqwest::Client,
    url: String,
    credentials: Credentials,
}

impl HttpSnapshotSource {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            url: format!("{}/api/memos", api.base_url.trim_end_matches('/')),
            credentials: api.credentials(),
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn load(&self) -> Result<BoardSnapshot> {
        let body = self
            .credentials
            .apply(self.http.get(&self.url))
            .send()
            .await
            .context("Failed to send board snapshot request")?
            .error_for_status()
            .context("Board snapshot endpoint returned error status")?
            .text()
            .await
            .context("Failed to read board snapshot body")?;
        BoardSnapshot::from_json(&body)
    }
}
