use crate::timeline::record::Record;
use crate::timeline::url_key::normalize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Extended,
}

/// The index points at the first record carrying a key, even when a loaded
/// prior result already holds colliding URLs.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            index.entry(normalize(&record.url)).or_insert(pos);
        }
        Self { records, index }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    // an older candidate widens the span but keeps the stored title and url
    pub fn reconcile(&mut self, candidate: Record) -> Upsert {
        let key = normalize(&candidate.url);
        let Some(&pos) = self.index.get(&key) else {
            self.index.insert(key, self.records.len());
            self.records.push(candidate);
            return Upsert::Inserted;
        };

        let existing = &mut self.records[pos];
        let is_latest = candidate.end >= existing.end;
        existing.start = existing.start.min(candidate.start);
        existing.end = existing.end.max(candidate.end);
        if is_latest {
            if existing.title != candidate.title {
                existing.title = candidate.title;
            }
            if existing.url != candidate.url {
                existing.url = candidate.url;
            }
        }
        Upsert::Extended
    }
}
