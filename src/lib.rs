pub mod analyzer;
pub mod config;
pub mod db;
pub mod dao;
pub mod mapping;
pub mod region;
pub mod resolver;
pub mod storage;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::analyzer::{analyze_document, analyze_html, Analyzer};
    pub use crate::analyzer::fetch::{FetchedPage, HttpFetcher, PageFetcher};
    pub use crate::analyzer::policy::ClassificationPolicy;
    pub use crate::config::FunnelConfig;
    pub use crate::region::{classify_region, Region, RegionInfo};
    pub use crate::resolver::Resolver;
    pub use crate::storage::{ContentEntry, ContentRepository};
    pub use crate::types::{AnalysisResult, ColorTag, ElementKind, MediaSlot, PageRole, ResolvedContent, VslElement};
    pub use crate::Funnel;
}

use anyhow::Result;
use tracing::info;

use crate::analyzer::fetch::HttpFetcher;
use crate::analyzer::Analyzer;
use crate::config::FunnelConfig;
use crate::dao::{BannerInsert, VideoInsert};
use crate::db::Database;
use crate::mapping::{regional_banner_key, regional_video_key};
use crate::region::{RegionInfo, RegionTable};
use crate::resolver::Resolver;
use crate::storage::ContentEntry;
use crate::types::{AnalysisResult, MediaSlot, PageRole, ResolvedContent};

/// Async library entry point. Owns the content store, the resolver over it
/// and the page analyzer.
pub struct Funnel {
    db: Database,
    resolver: Resolver<Database>,
    analyzer: Analyzer<HttpFetcher>,
    regions: RegionTable,
}

impl Funnel {
    /// Connect to the content store and (optionally) run migrations.
    pub async fn connect(config: &FunnelConfig, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(config.database_url.as_deref()).await?;
        if run_migrations { db.run_migrations().await?; }
        let resolver = Resolver::new(db.clone())
            .with_emergency_video_url(config.emergency_video_url.clone())
            .with_default_headline(config.default_headline.clone())
            .with_store_timeout(config.store_timeout());
        let analyzer = Analyzer::new(HttpFetcher::new(config.fetch_timeout())?, &config.site_origin)?
            .with_policy(config.analyzer.clone())
            .with_fetch_timeout(config.fetch_timeout());
        Ok(Self { db, resolver, analyzer, regions: config.region_table() })
    }

    pub fn database(&self) -> &Database { &self.db }
    pub fn resolver(&self) -> &Resolver<Database> { &self.resolver }
    pub fn analyzer(&self) -> &Analyzer<HttpFetcher> { &self.analyzer }

    pub fn classify(&self, hostname: &str) -> RegionInfo { self.regions.classify(hostname) }

    // --- Visitor-facing API ---

    /// Content for one page render. Always carries a playable video URL.
    pub async fn resolve_active_variant(&self, hostname: &str, role: PageRole) -> ResolvedContent {
        let region = self.classify(hostname);
        self.resolver.resolve_active_variant(role, &region).await
    }

    // --- Admin API ---

    /// Classify the rendered page for the admin visual map.
    pub async fn analyze(&self, role: PageRole) -> AnalysisResult {
        self.analyzer.analyze(role).await
    }

    /// Configured media per page for the host's region, without the display fallback.
    pub async fn media_inventory(&self, hostname: &str) -> Vec<MediaSlot> {
        let region = self.classify(hostname);
        let mut slots = Vec::with_capacity(PageRole::ALL.len());
        for role in PageRole::ALL {
            let video = self.resolver.inventory_video_entry(role, &region).await;
            let banner = self.resolver.banner_entry(role, &region).await;
            let (video_url, video_source_key) = video.map(|e| (e.url, e.page_key)).unzip();
            let (banner_url, banner_source_key) = banner.map(|e| (e.url, e.page_key)).unzip();
            slots.push(MediaSlot {
                role,
                video_key: regional_video_key(role, &region),
                video_url,
                video_source_key,
                banner_key: regional_banner_key(role, &region),
                banner_url,
                banner_source_key,
            });
        }
        slots
    }

    /// Store (or replace) the video for a page key.
    pub async fn put_video(&self, page_key: &str, url: &str, headline: Option<&str>) -> Result<()> {
        let insert = VideoInsert {
            page_key: page_key.trim().to_string(),
            url: url.trim().to_string(),
            headline: headline.map(str::trim).filter(|h| !h.is_empty()).map(str::to_string),
            created_at: current_epoch_millis(),
        };
        dao::upsert_video(self.db.pool(), &insert).await?;
        info!(key = %insert.page_key, url = %insert.url, "video stored");
        Ok(())
    }

    /// Store (or replace) the banner for a page key.
    pub async fn put_banner(&self, page_key: &str, url: &str) -> Result<()> {
        let insert = BannerInsert {
            page_key: page_key.trim().to_string(),
            url: url.trim().to_string(),
            created_at: current_epoch_millis(),
        };
        dao::upsert_banner(self.db.pool(), &insert).await?;
        info!(key = %insert.page_key, url = %insert.url, "banner stored");
        Ok(())
    }

    pub async fn delete_video(&self, page_key: &str) -> Result<u64> {
        dao::delete_video(self.db.pool(), page_key).await
    }

    pub async fn delete_banner(&self, page_key: &str) -> Result<u64> {
        dao::delete_banner(self.db.pool(), page_key).await
    }

    pub async fn list_videos(&self) -> Result<Vec<ContentEntry>> { dao::list_videos(self.db.pool()).await }

    pub async fn list_banners(&self) -> Result<Vec<ContentEntry>> { dao::list_banners(self.db.pool()).await }
}

fn current_epoch_millis() -> i64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}
