//! # Staleness Check (`common::archive::staleness`)
//!
//! File: cli/src/common/archive/staleness.rs
//! Author: Christi Mahu
//!
//! An archive is up to date when both the archive and the source directory
//! exist and the archive's modification time is strictly newer than the
//! directory's. Equal timestamps count as stale.
//!
use crate::common::fs::io::stat_or_none;
use crate::core::error::Result;
use anyhow::Context;
use std::path::Path;

/// Returns `true` when `output` can be reused instead of re-archiving `source`.
pub async fn is_up_to_date(output: &Path, source: &Path) -> Result<bool> {
    let (Some(out_meta), Some(src_meta)) = (stat_or_none(output).await?, stat_or_none(source).await?)
    else {
        return Ok(false);
    };
    let out_mtime = out_meta
        .modified()
        .with_context(|| format!("Failed to read modification time of {:?}", output))?;
    let src_mtime = src_meta
        .modified()
        .with_context(|| format!("Failed to read modification time of {:?}", source))?;
    Ok(out_mtime > src_mtime)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_paths_are_stale() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = temp_dir.path().join("app");
        let output = temp_dir.path().join("app.zip");
        assert!(!is_up_to_date(&output, &source).await?);
        fs::create_dir(&source)?;
        assert!(!is_up_to_date(&output, &source).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_newer_output_is_up_to_date() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = temp_dir.path().join("app");
        let output = temp_dir.path().join("app.zip");
        fs::create_dir(&source)?;
        fs::write(&output, "zip")?;
        set_file_mtime(&source, FileTime::from_unix_time(1_600_000_000, 0))?;
        set_file_mtime(&output, FileTime::from_unix_time(1_600_000_100, 0))?;
        assert!(is_up_to_date(&output, &source).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_equal_or_older_output_is_stale() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = temp_dir.path().join("app");
        let output = temp_dir.path().join("app.zip");
        fs::create_dir(&source)?;
        fs::write(&output, "zip")?;
        let t = FileTime::from_unix_time(1_600_000_000, 0);
        set_file_mtime(&source, t)?;
        set_file_mtime(&output, t)?;
        assert!(!is_up_to_date(&output, &source).await?);

        set_file_mtime(&output, FileTime::from_unix_time(1_500_000_000, 0))?;
        assert!(!is_up_to_date(&output, &source).await?);
        Ok(())
    }
}
