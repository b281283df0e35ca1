use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::commands::CommandReport;
use crate::error::TimelineError;
use crate::timeline::config::load_config;
use crate::timeline::rename_map;
use crate::timeline::sequencer::{SnapshotFile, extract_snapshot, snapshot_date};
use crate::timeline::store;

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub date: Option<String>,
    pub sections: Vec<String>,
    pub url_map: Option<PathBuf>,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, TimelineError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|err| TimelineError::InvalidConfig(format!("invalid --date `{raw}`: {err}")))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| path.display().to_string())
}

pub fn run(opts: &ExtractOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("extract");

    if !opts.file.is_file() {
        return Err(TimelineError::InvalidConfig(format!(
            "the file `{}` does not exist",
            opts.file.display()
        ))
        .into());
    }
    let sections = if opts.sections.is_empty() {
        cfg.targets.sections.clone()
    } else {
        opts.sections.clone()
    };
    if sections.is_empty() {
        return Err(TimelineError::InvalidConfig("no target sections given".to_string()).into());
    }

    let name = file_name(&opts.file);
    let date = match opts.date.as_deref() {
        Some(raw) => parse_date_arg(raw)?,
        None => snapshot_date(&name, &cfg.snapshots.suffix)?,
    };
    let url_map = opts.url_map.clone().or(cfg.rename.map_path.clone());
    let renames = rename_map::load(url_map.as_deref())?;

    report.detail(format!("file={}", opts.file.display()));
    report.detail(format!("date={date}"));
    report.detail(format!("sections={}", sections.join(",")));

    let snapshot = SnapshotFile {
        path: opts.file.clone(),
        name,
        date,
    };
    let extraction = match extract_snapshot(&snapshot, &sections, &renames) {
        Ok(extraction) => extraction,
        Err(err) if err.is_per_snapshot() => {
            report.issue(format!("[{}] {err}", err.code()));
            return Ok(report);
        }
        Err(err) => return Err(err.into()),
    };

    for skipped in &extraction.skipped {
        report.detail(format!(
            "leaf.skipped section={} item={} reason={}",
            skipped.section, skipped.label, skipped.reason
        ));
    }
    if extraction.sections_found.is_empty() {
        report.issue(format!(
            "no outline found with the title {}",
            sections
                .iter()
                .map(|s| format!("`{s}`"))
                .collect::<Vec<_>>()
                .join(" or ")
        ));
        return Ok(report);
    }
    for section in &extraction.sections_missing {
        report.detail(format!("section.missing={section}"));
    }

    report.detail(format!("candidates={}", extraction.candidates.len()));
    match opts.output.as_deref() {
        Some(path) => {
            let written = store::save(path, &extraction.candidates)?;
            report.detail(format!("written={}", written.display()));
        }
        None => {
            let body = store::render(&extraction.candidates)?;
            std::io::stdout()
                .lock()
                .write_all(body.as_bytes())
                .context("failed to write candidates to stdout")?;
            report.detail("written=stdout");
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::parse_date_arg;
    use chrono::NaiveDate;

    #[test]
    fn date_argument_accepts_compact_and_dashed_forms() {
        let want = NaiveDate::from_ymd_opt(2020, 1, 19).expect("date");
        assert_eq!(parse_date_arg("20200119").expect("compact"), want);
        assert_eq!(parse_date_arg(" 2020-01-19 ").expect("dashed"), want);
        assert!(parse_date_arg("19/01/2020").is_err());
    }
}
