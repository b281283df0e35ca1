use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::error::TimelineError;
use crate::timeline::config::load_config;
use crate::timeline::reconcile::RecordSet;
use crate::timeline::rename_map;
use crate::timeline::sequencer::{self, list_snapshots};
use crate::timeline::store;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub sections: Vec<String>,
    pub url_map: Option<PathBuf>,
    pub fresh: bool,
    pub no_backup: bool,
    pub dry_run: bool,
}

pub fn run(opts: &ConvertOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("convert");

    let sections = if opts.sections.is_empty() {
        cfg.targets.sections.clone()
    } else {
        opts.sections.clone()
    };
    if sections.is_empty() {
        return Err(TimelineError::InvalidConfig(
            "no target sections given; pass them as a comma-separated list or set OPML_TIMELINE_SECTIONS"
                .to_string(),
        )
        .into());
    }
    let url_map = opts.url_map.clone().or(cfg.rename.map_path.clone());
    let renames = rename_map::load(url_map.as_deref())?;
    let snapshots = list_snapshots(&opts.input_dir, &cfg.snapshots.suffix)?;

    let prior = if opts.fresh {
        Vec::new()
    } else {
        store::load_existing(&opts.output)?
    };

    report.detail(format!("input_dir={}", opts.input_dir.display()));
    report.detail(format!("output={}", opts.output.display()));
    report.detail(format!("sections={}", sections.join(",")));
    match &url_map {
        Some(path) => report.detail(format!(
            "url_map={} entries={}",
            path.display(),
            renames.len()
        )),
        None => report.detail("url_map=none"),
    }
    if url_map.is_some() && renames.is_empty() {
        report.detail("url_map has no entries");
    }
    report.detail(format!("prior_records={}", prior.len()));

    let mut set = RecordSet::from_records(prior);
    let outcome = sequencer::run(&mut set, &snapshots, &sections, &renames);

    report.detail(format!("snapshots={}", outcome.snapshots));
    report.detail(format!("snapshots.processed={}", outcome.processed));
    report.detail(format!("candidates={}", outcome.candidates));
    report.detail(format!("records.inserted={}", outcome.inserted));
    report.detail(format!("records.extended={}", outcome.extended));
    report.detail(format!("leaves.skipped={}", outcome.skipped_leaves));
    for (name, section) in &outcome.missing_sections {
        report.detail(format!("section.missing file={name} section={section}"));
    }
    for failure in &outcome.failures {
        report.issue(format!(
            "snapshot {} skipped [{}]: {}",
            failure.name, failure.code, failure.message
        ));
    }
    report.detail(format!("records={}", set.len()));
    if set.is_empty() {
        report.detail("no records collected; check the section names");
    }

    if opts.dry_run {
        report.detail("dry-run: output left untouched");
        return Ok(report);
    }

    if cfg.output.backup
        && !opts.no_backup
        && let Some(backup) = store::rotate_backup(&opts.output)?
    {
        report.detail(format!("backup={}", backup.display()));
    }
    let written = store::save(&opts.output, set.records())?;
    report.detail(format!("written={}", written.display()));

    Ok(report)
}
