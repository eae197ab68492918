use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vsl_funnel::types::PageRole;

/// Content and page-structure tooling for the VSL funnel
#[derive(Parser)]
#[command(name = "funnel")]
#[command(about = "Resolve funnel content, analyze rendered pages and manage media slots", long_about = None)]
pub struct Cli {
    /// Config file (defaults to funnel.toml in the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the content a visitor on HOST would see
    Resolve {
        #[arg(long)]
        host: String,
        #[arg(long, default_value = "home")]
        page: PageRole,
    },
    /// Fetch a rendered page and classify its elements
    Analyze {
        #[arg(long, default_value = "home")]
        page: PageRole,
        /// Override the configured site origin
        #[arg(long)]
        origin: Option<String>,
    },
    /// Show the region a hostname maps to
    Regions {
        #[arg(long)]
        host: String,
    },
    /// Manage stored videos and banners
    Media {
        #[command(subcommand)]
        action: MediaAction,
    },
}

#[derive(Subcommand)]
pub enum MediaAction {
    /// List every stored video and banner
    List,
    /// Show configured media per page for a host's region
    Inventory {
        #[arg(long)]
        host: String,
    },
    PutVideo {
        key: String,
        url: String,
        #[arg(long)]
        headline: Option<String>,
    },
    PutBanner {
        key: String,
        url: String,
    },
    DeleteVideo {
        key: String,
    },
    DeleteBanner {
        key: String,
    },
}
