use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("config invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("url map unusable: {0}")]
    RenameMap(String),
    #[error("snapshot name `{name}` carries no usable YYYYMMDD date: {reason}")]
    SnapshotDate { name: String, reason: String },
    #[error("`{0}` does not appear to be a valid OPML document")]
    NotOutlineDocument(String),
    #[error("OPML file `{0}` does not contain a body element")]
    MissingBody(String),
    #[error("OPML file `{file}` could not be parsed: {reason}")]
    MalformedDocument { file: String, reason: String },
}

impl TimelineError {
    /// Document-level failures only cost the one snapshot they occur in.
    pub fn is_per_snapshot(&self) -> bool {
        matches!(
            self,
            Self::NotOutlineDocument(_) | Self::MissingBody(_) | Self::MalformedDocument { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E001_CONFIG_INVALID",
            Self::RenameMap(_) => "E002_URL_MAP_INVALID",
            Self::SnapshotDate { .. } => "E003_SNAPSHOT_DATE",
            Self::NotOutlineDocument(_) => "E004_NOT_OPML",
            Self::MissingBody(_) => "E005_MISSING_BODY",
            Self::MalformedDocument { .. } => "E006_MALFORMED_XML",
        }
    }
}
