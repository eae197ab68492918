use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::storage::ContentEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInsert {
    pub page_key: String,
    pub url: String,
    pub headline: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerInsert {
    pub page_key: String,
    pub url: String,
    pub created_at: i64,
}

// Use COALESCE to avoid decoding NULL directly into Option<String> with the Any driver
type EntryRow = (String, String, String, i64);

fn entry_from_row((page_key, url, headline, created_at): EntryRow) -> ContentEntry {
    ContentEntry {
        page_key,
        url,
        headline: Some(headline).filter(|h| !h.trim().is_empty()),
        created_at,
    }
}

fn check_key(page_key: &str) -> Result<()> {
    if page_key.trim().is_empty() {
        bail!("page_key must not be empty");
    }
    Ok(())
}

fn check_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid content url {raw}: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("content url must be http(s), got scheme `{other}`: {raw}"),
    }
}

pub async fn upsert_video(pool: &AnyPool, v: &VideoInsert) -> Result<()> {
    check_key(&v.page_key)?;
    check_url(&v.url)?;
    sqlx::query(
        "INSERT INTO video_entries(page_key, url, headline, created_at) VALUES(?, ?, ?, ?)\n         ON CONFLICT(page_key) DO UPDATE SET\n           url=excluded.url, headline=excluded.headline, created_at=excluded.created_at",
    )
    .bind(&v.page_key)
    .bind(&v.url)
    .bind(&v.headline)
    .bind(v.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_banner(pool: &AnyPool, b: &BannerInsert) -> Result<()> {
    check_key(&b.page_key)?;
    check_url(&b.url)?;
    sqlx::query(
        "INSERT INTO banner_entries(page_key, url, created_at) VALUES(?, ?, ?)\n         ON CONFLICT(page_key) DO UPDATE SET url=excluded.url, created_at=excluded.created_at",
    )
    .bind(&b.page_key)
    .bind(&b.url)
    .bind(b.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_video_by_key(pool: &AnyPool, page_key: &str) -> Result<Option<ContentEntry>> {
    let row = sqlx::query_as::<_, EntryRow>(
        "SELECT page_key, url, COALESCE(headline, ''), created_at FROM video_entries WHERE page_key = ? LIMIT 1",
    )
    .bind(page_key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(entry_from_row))
}

pub async fn find_video_most_recent(pool: &AnyPool) -> Result<Option<ContentEntry>> {
    let row = sqlx::query_as::<_, EntryRow>(
        "SELECT page_key, url, COALESCE(headline, ''), created_at FROM video_entries\n         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(entry_from_row))
}

pub async fn find_banner_by_key(pool: &AnyPool, page_key: &str) -> Result<Option<ContentEntry>> {
    let row = sqlx::query_as::<_, EntryRow>(
        "SELECT page_key, url, '', created_at FROM banner_entries WHERE page_key = ? LIMIT 1",
    )
    .bind(page_key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(entry_from_row))
}

pub async fn list_videos(pool: &AnyPool) -> Result<Vec<ContentEntry>> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT page_key, url, COALESCE(headline, ''), created_at FROM video_entries ORDER BY page_key",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(entry_from_row).collect())
}

pub async fn list_banners(pool: &AnyPool) -> Result<Vec<ContentEntry>> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT page_key, url, '', created_at FROM banner_entries ORDER BY page_key",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(entry_from_row).collect())
}

pub async fn delete_video(pool: &AnyPool, page_key: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM video_entries WHERE page_key = ?")
        .bind(page_key)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_banner(pool: &AnyPool, page_key: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM banner_entries WHERE page_key = ?")
        .bind(page_key)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
