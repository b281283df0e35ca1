use crate::error::TimelineError;
use crate::timeline::extract::{Extraction, extract};
use crate::timeline::outline;
use crate::timeline::reconcile::{RecordSet, Upsert};
use crate::timeline::record::midnight;
use crate::timeline::rename_map::RenameMap;
use crate::timeline::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_STAMP_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SnapshotFailure {
    pub name: String,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub snapshots: usize,
    pub processed: usize,
    pub candidates: usize,
    pub inserted: usize,
    pub extended: usize,
    pub skipped_leaves: usize,
    pub missing_sections: Vec<(String, String)>,
    pub failures: Vec<SnapshotFailure>,
}

// `prefix-YYYYMMDD<suffix>`
pub fn snapshot_date(name: &str, suffix: &str) -> Result<NaiveDate, TimelineError> {
    let fail = |reason: String| TimelineError::SnapshotDate {
        name: name.to_string(),
        reason,
    };
    let stem = name.strip_suffix(suffix).unwrap_or(name);
    let Some(segment) = stem.split('-').nth(1) else {
        return Err(fail("expected `prefix-YYYYMMDD`".to_string()));
    };
    if segment.len() != DATE_STAMP_LEN || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail(format!("`{segment}` is not an 8-digit date stamp")));
    }
    NaiveDate::parse_from_str(segment, "%Y%m%d")
        .map_err(|err| fail(format!("`{segment}`: {err}")))
}

/// Oldest first, equal dates in file-name order. An undated name aborts
/// the listing.
pub fn list_snapshots(dir: &Path, suffix: &str) -> Result<Vec<SnapshotFile>> {
    if !dir.is_dir() {
        return Err(TimelineError::InvalidConfig(format!(
            "the input `{}` is not a directory",
            dir.display()
        ))
        .into());
    }

    let mut out = Vec::new();
    let read_dir =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            continue;
        };
        if !name.ends_with(suffix) {
            continue;
        }
        let date = snapshot_date(&name, suffix)?;
        out.push(SnapshotFile { path, name, date });
    }

    out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    Ok(out)
}

pub fn extract_snapshot(
    snapshot: &SnapshotFile,
    sections: &[String],
    renames: &RenameMap,
) -> Result<Extraction, TimelineError> {
    let xml = fs::read(&snapshot.path).map_err(|err| TimelineError::MalformedDocument {
        file: snapshot.name.clone(),
        reason: format!("failed to read {}: {err}", snapshot.path.display()),
    })?;
    let root = outline::parse(&xml, &snapshot.name)?;
    extract(&root, &snapshot.name, sections, midnight(snapshot.date), renames)
}

fn report_skips(snapshot: &SnapshotFile, extraction: &Extraction) {
    for skipped in &extraction.skipped {
        warn::emit(&WarnEvent {
            code: "W001_LEAF_SKIPPED",
            stage: "extract",
            file: &snapshot.name,
            item: &skipped.label,
            reason: &skipped.reason,
            err: "",
        });
    }
}

pub fn run(
    set: &mut RecordSet,
    snapshots: &[SnapshotFile],
    sections: &[String],
    renames: &RenameMap,
) -> RunOutcome {
    let mut outcome = RunOutcome {
        snapshots: snapshots.len(),
        ..RunOutcome::default()
    };

    for snapshot in snapshots {
        let extraction = match extract_snapshot(snapshot, sections, renames) {
            Ok(extraction) => extraction,
            Err(err) => {
                let message = err.to_string();
                warn::emit(&WarnEvent {
                    code: err.code(),
                    stage: "snapshot",
                    file: &snapshot.name,
                    item: "",
                    reason: "snapshot skipped",
                    err: &message,
                });
                outcome.failures.push(SnapshotFailure {
                    name: snapshot.name.clone(),
                    code: err.code(),
                    message,
                });
                continue;
            }
        };

        report_skips(snapshot, &extraction);
        outcome.processed += 1;
        outcome.skipped_leaves += extraction.skipped.len();
        outcome.candidates += extraction.candidates.len();
        for section in extraction.sections_missing {
            outcome.missing_sections.push((snapshot.name.clone(), section));
        }
        for candidate in extraction.candidates {
            match set.reconcile(candidate) {
                Upsert::Inserted => outcome.inserted += 1,
                Upsert::Extended => outcome.extended += 1,
            }
        }
    }

    outcome
}
