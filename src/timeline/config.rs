use crate::error::TimelineError;
use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "OPML_TIMELINE_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub suffix: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            suffix: ".opml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TargetConfig {
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RenameConfig {
    pub map_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub backup: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { backup: true }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TimelineConfig {
    pub snapshots: SnapshotConfig,
    pub targets: TargetConfig,
    pub rename: RenameConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialTimelineConfig {
    snapshots: Option<SnapshotConfig>,
    targets: Option<TargetConfig>,
    rename: Option<RenameConfig>,
    output: Option<OutputConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_path(var: &str, fallback: Option<PathBuf>) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => fallback,
    }
}

pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = split_csv(&v);
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

pub fn validate(cfg: &TimelineConfig) -> Result<(), TimelineError> {
    if cfg.snapshots.suffix.trim().is_empty() {
        return Err(TimelineError::InvalidConfig(
            "snapshot suffix cannot be empty".to_string(),
        ));
    }
    if cfg.targets.sections.iter().any(|s| s.is_empty()) {
        return Err(TimelineError::InvalidConfig(
            "target section names cannot be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var(CONFIG_PATH_VAR) {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("opml-timeline").join("config.toml"))
}

fn merge_toml(base: &mut TimelineConfig, raw: &str, path: &Path) -> Result<(), TimelineError> {
    let parsed: PartialTimelineConfig = toml::from_str(raw).map_err(|err| {
        TimelineError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    if let Some(snapshots) = parsed.snapshots {
        base.snapshots = snapshots;
    }
    if let Some(targets) = parsed.targets {
        base.targets = targets;
    }
    if let Some(rename) = parsed.rename {
        base.rename = rename;
    }
    if let Some(output) = parsed.output {
        base.output = output;
    }
    Ok(())
}

fn merge_file_config(base: &mut TimelineConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path).map_err(|err| {
        TimelineError::InvalidConfig(format!("failed to read {}: {err}", path.display()))
    })?;
    merge_toml(base, &raw, &path)?;
    Ok(())
}

pub fn load_config() -> Result<TimelineConfig> {
    let mut cfg = TimelineConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.snapshots.suffix = env_or_string("OPML_TIMELINE_SNAPSHOT_SUFFIX", &cfg.snapshots.suffix);
    cfg.targets.sections = env_or_csv("OPML_TIMELINE_SECTIONS", &cfg.targets.sections);
    cfg.rename.map_path = env_or_path("OPML_TIMELINE_URL_MAP", cfg.rename.map_path.take());
    cfg.output.backup = env_or_bool("OPML_TIMELINE_BACKUP", cfg.output.backup);

    validate(&cfg)?;
    Ok(cfg)
}
