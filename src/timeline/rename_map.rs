use crate::error::TimelineError;
use crate::timeline::url_key::normalize;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenameEntry {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenameMap {
    by_key: HashMap<String, String>,
}

impl RenameMap {
    pub fn from_entries(entries: Vec<RenameEntry>) -> Self {
        let mut by_key = HashMap::with_capacity(entries.len());
        for entry in entries {
            // earliest entry wins, matching a front-to-back scan
            by_key.entry(normalize(&entry.old)).or_insert(entry.new);
        }
        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn apply(&self, url: &str) -> String {
        match self.by_key.get(&normalize(url)) {
            Some(mapped) => mapped.clone(),
            None => url.to_string(),
        }
    }
}

pub fn parse(raw: &str) -> Result<RenameMap, TimelineError> {
    let entries: Vec<RenameEntry> =
        json5::from_str(raw).map_err(|err| TimelineError::RenameMap(err.to_string()))?;
    Ok(RenameMap::from_entries(entries))
}

pub fn load(path: Option<&Path>) -> Result<RenameMap, TimelineError> {
    let Some(path) = path else {
        return Ok(RenameMap::default());
    };
    if !path.is_file() {
        return Err(TimelineError::RenameMap(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path).map_err(|err| {
        TimelineError::RenameMap(format!("failed to read {}: {err}", path.display()))
    })?;
    parse(&raw).map_err(|err| match err {
        TimelineError::RenameMap(reason) => {
            TimelineError::RenameMap(format!("failed to parse {}: {reason}", path.display()))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_resource_is_identity() {
        let map = load(None).expect("load");
        assert!(map.is_empty());
        assert_eq!(map.apply("HTTP://Keep.Me/"), "HTTP://Keep.Me/");
    }

    #[test]
    fn lookup_goes_through_the_normalized_key() {
        let map = RenameMap::from_entries(vec![RenameEntry {
            old: "http://old.com".into(),
            new: "http://new.com".into(),
        }]);
        assert_eq!(map.apply("http://old.com/"), "http://new.com");
        assert_eq!(map.apply("HTTPS://OLD.com"), "http://new.com");
        assert_eq!(map.apply("http://other.com/"), "http://other.com/");
    }

    #[test]
    fn first_entry_wins_on_colliding_keys() {
        let map = RenameMap::from_entries(vec![
            RenameEntry {
                old: "http://a.com/".into(),
                new: "first".into(),
            },
            RenameEntry {
                old: "https://a.com".into(),
                new: "second".into(),
            },
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.apply("a.com"), "first");
    }

    #[test]
    fn json5_comments_are_accepted() {
        let raw = "[\n  // moved in 2021\n  {old: \"http://old.com\", new: \"http://new.com\"},\n]";
        let map = parse(raw).expect("parse");
        assert_eq!(map.apply("old.com"), "http://new.com");
    }

    #[test]
    fn unreadable_or_malformed_map_is_fatal() {
        let tmp = tempdir().expect("tempdir");
        let missing = tmp.path().join("missing.json");
        assert!(matches!(
            load(Some(&missing)),
            Err(TimelineError::RenameMap(_))
        ));

        let bad = tmp.path().join("bad.json");
        fs::write(&bad, "{\"old\": \"x\"}").expect("write");
        let err = load(Some(&bad)).expect_err("must fail");
        assert!(err.to_string().contains("failed to parse"));
    }
}
