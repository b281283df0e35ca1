use crate::error::TimelineError;
use crate::timeline::record::Record;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn load_existing(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: Vec<Record> = serde_json::from_str(&raw).map_err(|err| {
        TimelineError::InvalidConfig(format!(
            "existing output {} is not a record list: {err}",
            path.display()
        ))
    })?;
    Ok(parsed)
}

// first free `<stem>_<n><ext>`, n from 1
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let mut counter = 1usize;
    loop {
        let candidate = path.with_file_name(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

pub fn rotate_backup(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let target = backup_path(path);
    fs::rename(path, &target).with_context(|| {
        format!("failed to back up {} to {}", path.display(), target.display())
    })?;
    Ok(Some(target))
}

pub fn render(records: &[Record]) -> Result<String> {
    let data = serde_json::to_string_pretty(records)?;
    Ok(format!("{data}\n"))
}

pub fn save(path: &Path, records: &[Record]) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let body = render(records)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("failed to stage output in {}", parent.display()))?;
    tmp.write_all(body.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}
