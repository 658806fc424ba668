use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Writes the rendered digest to `<dir>/digest_<YYYYmmdd_HHMMSS>.txt`,
/// creating the directory if needed. Returns the file path.
pub async fn save_digest(dir: &Path, body: &str, generated_at: NaiveDateTime) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let path = dir.join(format!(
        "digest_{}.txt",
        generated_at.format("%Y%m%d_%H%M%S")
    ));
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("Failed to write digest: {}", path.display()))?;

    Ok(path)
}
