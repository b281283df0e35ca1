use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::timeline::config::{load_config, resolve_config_path};

include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));

const ENV_PREFIX: &str = "OPML_TIMELINE_";

fn unknown_env_keys<I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = keys
        .into_iter()
        .filter(|k| k.starts_with(ENV_PREFIX))
        .filter(|k| !GENERATED_ENV_ALLOWLIST.contains(&k.as_str()))
        .collect();
    out.sort();
    out
}

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("status");

    match resolve_config_path() {
        Some(path) if path.exists() => report.detail(format!("config_file={}", path.display())),
        Some(path) => report.detail(format!("config_file={} (absent)", path.display())),
        None => report.detail("config_file=none"),
    }

    let cfg = load_config()?;
    report.detail(format!("snapshots.suffix={}", cfg.snapshots.suffix));
    report.detail(format!("targets.sections={}", cfg.targets.sections.join(",")));
    match &cfg.rename.map_path {
        Some(path) if path.is_file() => {
            report.detail(format!("rename.map_path={}", path.display()))
        }
        Some(path) => report.issue(format!("rename.map_path={} is missing", path.display())),
        None => report.detail("rename.map_path=none"),
    }
    report.detail(format!("output.backup={}", cfg.output.backup));

    let mut set: Vec<String> = env::vars()
        .map(|(k, _)| k)
        .filter(|k| GENERATED_ENV_ALLOWLIST.contains(&k.as_str()))
        .collect();
    set.sort();
    for key in set {
        report.detail(format!("env.{key}=set"));
    }
    for key in unknown_env_keys(env::vars().map(|(k, _)| k)) {
        report.issue(format!("unrecognised environment variable {key}"));
    }

    Ok(report)
}
