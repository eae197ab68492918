use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored video or banner slot. `created_at` is unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub page_key: String,
    pub url: String,
    pub headline: Option<String>,
    pub created_at: i64,
}

/// Typed read contract over the content store. Implementations return
/// `Ok(None)` for a missing key and `Err` only for query/transport failures.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_video_by_key(&self, key: &str) -> Result<Option<ContentEntry>>;
    async fn find_video_most_recent(&self) -> Result<Option<ContentEntry>>;
    async fn find_banner_by_key(&self, key: &str) -> Result<Option<ContentEntry>>;
}

