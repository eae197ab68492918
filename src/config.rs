use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::analyzer::policy::ClassificationPolicy;
use crate::region::{RegionRule, RegionTable};
use crate::resolver::{DEFAULT_HEADLINE, EMERGENCY_VIDEO_URL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    pub database_url: Option<String>,
    /// Origin the analyzer resolves page paths against.
    pub site_origin: String,
    pub emergency_video_url: String,
    pub default_headline: String,
    pub store_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    /// Host substring rules; empty means the built-in production table.
    pub regions: Vec<RegionRule>,
    pub analyzer: ClassificationPolicy,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            site_origin: "http://localhost:3000".to_string(),
            emergency_video_url: EMERGENCY_VIDEO_URL.to_string(),
            default_headline: DEFAULT_HEADLINE.to_string(),
            store_timeout_ms: 10_000,
            fetch_timeout_ms: 10_000,
            regions: Vec::new(),
            analyzer: ClassificationPolicy::default(),
        }
    }
}

impl FunnelConfig {
    /// Load from an explicit file, else `funnel.toml` in the config dir if it
    /// exists, else defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        let mut cfg = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config: {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("FUNNEL_DATABASE_URL") {
            if !url.trim().is_empty() { self.database_url = Some(url); }
        }
        if let Ok(origin) = std::env::var("FUNNEL_SITE_ORIGIN") {
            if !origin.trim().is_empty() { self.site_origin = origin; }
        }
        if let Some(ms) = std::env::var("FUNNEL_STORE_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()) {
            self.store_timeout_ms = ms;
        }
        if let Some(ms) = std::env::var("FUNNEL_FETCH_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()) {
            self.fetch_timeout_ms = ms;
        }
    }

    pub fn region_table(&self) -> RegionTable {
        if self.regions.is_empty() {
            RegionTable::default()
        } else {
            RegionTable::new(self.regions.clone())
        }
    }

    pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms.max(1)) }

    pub fn fetch_timeout(&self) -> Duration { Duration::from_millis(self.fetch_timeout_ms.max(1)) }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "vsl-funnel", "vsl-funnel").map(|p| p.config_dir().join("funnel.toml"))
}
