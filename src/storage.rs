use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

/// One exported row per resolved page ID. Field renames fix the CSV header
/// to `pageID,title,revisions_count`.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    #[serde(rename = "pageID")]
    pub page_id: u64,
    pub title: String,
    pub revisions_count: usize,
}

/// Sharded path for a page's raw text: `<root>/<id / 1000>/<id>.txt`.
pub fn page_path(root: &Path, page_id: u64) -> PathBuf {
    root.join((page_id / 1000).to_string())
        .join(format!("{page_id}.txt"))
}

/// Write raw page text under its shard, overwriting any previous run's file.
pub fn save_page_content(root: &Path, page_id: u64, content: &str) -> Result<PathBuf> {
    let path = page_path(root, page_id);
    if let Some(shard) = path.parent() {
        fs::create_dir_all(shard)
            .with_context(|| format!("Failed to create shard dir {}", shard.display()))?;
    }
    fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Write all records as one flat CSV table, replacing any existing file.
/// An empty run writes nothing.
pub fn export_csv(records: &[PageRecord], path: &Path) -> Result<()> {
    if records.is_empty() {
        warn!("No data collected, skipping CSV save");
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Data saved to {} ({} rows)", path.display(), records.len());
    Ok(())
}
