mod cli;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, MediaAction};
use vsl_funnel::analyzer::fetch::HttpFetcher;
use vsl_funnel::analyzer::Analyzer;
use vsl_funnel::config::FunnelConfig;
use vsl_funnel::Funnel;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = FunnelConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Regions { host } => print_json(&config.region_table().classify(&host))?,
        Commands::Analyze { page, origin } => {
            // Analysis needs no database.
            let origin = origin.unwrap_or_else(|| config.site_origin.clone());
            let analyzer = Analyzer::new(HttpFetcher::new(config.fetch_timeout())?, &origin)?
                .with_policy(config.analyzer.clone())
                .with_fetch_timeout(config.fetch_timeout());
            let result = analyzer.analyze(page).await;
            if result.is_empty() {
                eprintln!("No elements identified on {}", analyzer.page_url(page)?);
            }
            print_json(&result)?;
        }
        Commands::Resolve { host, page } => {
            let funnel = Funnel::connect(&config, true).await?;
            print_json(&funnel.resolve_active_variant(&host, page).await)?;
        }
        Commands::Media { action } => {
            let funnel = Funnel::connect(&config, true).await?;
            match action {
                MediaAction::List => {
                    println!("Videos:");
                    for v in funnel.list_videos().await? {
                        println!("  {} -> {}{}", v.page_key, v.url, v.headline.map(|h| format!(" ({h})")).unwrap_or_default());
                    }
                    println!("Banners:");
                    for b in funnel.list_banners().await? {
                        println!("  {} -> {}", b.page_key, b.url);
                    }
                }
                MediaAction::Inventory { host } => print_json(&funnel.media_inventory(&host).await)?,
                MediaAction::PutVideo { key, url, headline } => {
                    funnel.put_video(&key, &url, headline.as_deref()).await?;
                    println!("Stored video {key}");
                }
                MediaAction::PutBanner { key, url } => {
                    funnel.put_banner(&key, &url).await?;
                    println!("Stored banner {key}");
                }
                MediaAction::DeleteVideo { key } => {
                    let n = funnel.delete_video(&key).await?;
                    println!("Removed {n} video(s) for {key}");
                }
                MediaAction::DeleteBanner { key } => {
                    let n = funnel.delete_banner(&key).await?;
                    println!("Removed {n} banner(s) for {key}");
                }
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
