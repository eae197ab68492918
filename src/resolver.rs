//! Layered content resolution for funnel pages.
//!
//! Video lookup walks four tiers and stops at the first hit:
//!
//! 1. regional key (`home_vsl_br`)
//! 2. global key (`home_vsl`)
//! 3. most recently created video under any key
//! 4. the configured emergency URL (display path only)
//!
//! Banners only use tiers 1 and 2. A store error or timeout at any tier is
//! logged and treated as a miss, so none of the public methods can fail.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::mapping::{global_banner_key, global_video_key, regional_banner_key, regional_video_key};
use crate::region::RegionInfo;
use crate::storage::{ContentEntry, ContentRepository};
use crate::types::{PageRole, ResolvedContent};

pub const EMERGENCY_VIDEO_URL: &str = "https://cdn.metodovsl.com/vsl/emergency-fallback.mp4";
pub const DEFAULT_HEADLINE: &str = "Assista ao vídeo abaixo antes que ele saia do ar";

pub struct Resolver<R> {
    repo: R,
    emergency_video_url: String,
    default_headline: String,
    store_timeout: Duration,
}

impl<R: ContentRepository> Resolver<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            emergency_video_url: EMERGENCY_VIDEO_URL.to_string(),
            default_headline: DEFAULT_HEADLINE.to_string(),
            store_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_emergency_video_url(mut self, url: impl Into<String>) -> Self {
        self.emergency_video_url = url.into();
        self
    }

    pub fn with_default_headline(mut self, headline: impl Into<String>) -> Self {
        self.default_headline = headline.into();
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn repository(&self) -> &R { &self.repo }

    pub fn emergency_video_url(&self) -> &str { &self.emergency_video_url }

    /// Video URL for visitors. Never empty: falls back to the emergency URL.
    pub async fn resolve_for_display(&self, role: PageRole, region: &RegionInfo) -> String {
        match self.resolve_video_entry(role, region).await {
            Some(entry) => entry.url,
            None => self.emergency_url(role),
        }
    }

    /// Video URL for admin views. `None` means nothing is configured at all.
    pub async fn resolve_for_inventory(&self, role: PageRole, region: &RegionInfo) -> Option<String> {
        self.inventory_video_entry(role, region).await.map(|e| e.url)
    }

    /// Same chain as [`Self::resolve_for_inventory`], keeping the matched row so
    /// callers can tell which key actually served the slot.
    pub async fn inventory_video_entry(&self, role: PageRole, region: &RegionInfo) -> Option<ContentEntry> {
        self.resolve_video_entry(role, region).await
    }

    pub async fn resolve_banner(&self, role: PageRole, region: &RegionInfo) -> Option<String> {
        self.banner_entry(role, region).await.map(|e| e.url)
    }

    pub async fn banner_entry(&self, role: PageRole, region: &RegionInfo) -> Option<ContentEntry> {
        let regional = regional_banner_key(role, region);
        if let Some(hit) = self.tier("banner regional", &regional, self.repo.find_banner_by_key(&regional)).await {
            return Some(hit);
        }
        let global = global_banner_key(role);
        self.tier("banner global", &global, self.repo.find_banner_by_key(&global)).await
    }

    /// Everything the page renderer needs for one request.
    pub async fn resolve_active_variant(&self, role: PageRole, region: &RegionInfo) -> ResolvedContent {
        let entry = self.resolve_video_entry(role, region).await;
        let banner_url = self.resolve_banner(role, region).await;
        let headline = entry
            .as_ref()
            .and_then(|e| e.headline.clone())
            .unwrap_or_else(|| self.default_headline.clone());
        let video_url = match entry {
            Some(e) => e.url,
            None => self.emergency_url(role),
        };
        ResolvedContent { video_url: Some(video_url), banner_url, headline, currency: region.currency.clone() }
    }

    // Tiers 1-3. Each query is only issued when the previous tier missed.
    async fn resolve_video_entry(&self, role: PageRole, region: &RegionInfo) -> Option<ContentEntry> {
        let regional = regional_video_key(role, region);
        if let Some(hit) = self.tier("video regional", &regional, self.repo.find_video_by_key(&regional)).await {
            return Some(hit);
        }
        let global = global_video_key(role);
        if let Some(hit) = self.tier("video global", &global, self.repo.find_video_by_key(&global)).await {
            return Some(hit);
        }
        // Any stored video beats a blank slot; this can surface an unrelated upload.
        let hit = self.tier("video any-row", "*", self.repo.find_video_most_recent()).await;
        if let Some(entry) = &hit {
            info!(page = role.key_prefix(), key = %entry.page_key, "using most recent video as fallback");
        }
        hit
    }

    async fn tier<F>(&self, tier: &str, key: &str, query: F) -> Option<ContentEntry>
    where
        F: Future<Output = anyhow::Result<Option<ContentEntry>>>,
    {
        match tokio::time::timeout(self.store_timeout, query).await {
            Ok(Ok(Some(entry))) => {
                debug!(tier, key, url = %entry.url, "content hit");
                Some(entry)
            }
            Ok(Ok(None)) => {
                debug!(tier, key, "content miss");
                None
            }
            Ok(Err(e)) => {
                warn!(tier, key, error = %e, "content store query failed; skipping tier");
                None
            }
            Err(_) => {
                warn!(tier, key, timeout_ms = self.store_timeout.as_millis() as u64, "content store query timed out; skipping tier");
                None
            }
        }
    }

    fn emergency_url(&self, role: PageRole) -> String {
        info!(page = role.key_prefix(), "no stored video; serving emergency url");
        self.emergency_video_url.clone()
    }
}
