use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Suffix of in-flight artifacts; anything carrying it is garbage after a crash.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error unless the directory already exists.
pub(crate) fn require_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Write `path` by filling a sibling temporary file and renaming it into place,
/// so readers never observe a partially written artifact.
pub(crate) fn publish_atomic(path: &Path, fill: impl FnOnce(&mut NamedTempFile) -> Result<()>) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    ensure_dir_exists(dir)?;

    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("artifact");
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    fill(&mut tmp)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to publish {}", path.display()))?;
    Ok(())
}

/// Write raw bytes atomically.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    publish_atomic(path, |tmp| Ok(tmp.write_all(bytes)?))
}

/// Delete temporary artifacts left behind by an interrupted run. Returns how many were removed.
pub(crate) fn remove_stale_temps(dir: &Path) -> Result<usize> {
    if !dir.exists() { return Ok(0) }
    let mut removed = 0;
    for entry in WalkDir::new(dir).max_depth(1).into_iter().filter_map(|e| e.ok()) {
        let stale = entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(|n| n.ends_with(TEMP_SUFFIX));
        if stale {
            fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove stale file {}", entry.path().display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Hex SHA-256 of a byte slice.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_atomic_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        write_bytes_atomic(&target, b"hello").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"hello");
        assert_eq!(remove_stale_temps(dir.path()).unwrap(), 0);
    }

    #[test]
    fn failed_fill_does_not_publish() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let result = publish_atomic(&target, |_| anyhow::bail!("boom"));
        assert!(result.is_err());
        assert!(!target.exists());
    }

    #[test]
    fn stale_temps_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gen1.csv.abc.tmp"), b"partial").unwrap();
        fs::write(dir.path().join("keep.csv"), b"done").unwrap();
        assert_eq!(remove_stale_temps(dir.path()).unwrap(), 1);
        assert!(dir.path().join("keep.csv").exists());
    }

    #[test]
    fn sha256_is_stable() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
