use crate::error::{CmsError, Result};
use crate::record::{Record, Status};
use crate::sheet::{HEADER_OFFSET, SheetContents};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// In-memory handle of a cached record, stable while the record stays cached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey(Uuid);

impl RecordKey {
    fn new() -> Self {
        RecordKey(Uuid::new_v4())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(RecordKey)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CachedRecord {
    pub key: RecordKey,

    /// 1-based sheet row the record lives on
    pub row: usize,

    pub record: Record,
}

/// Category / status / free-text criteria, all conjunctive
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub category: Option<String>,
    pub status: Option<Status>,
    pub search: String,
}

impl Filter {
    pub fn new(category: Option<&str>, status: Option<Status>, search: &str) -> Self {
        Filter {
            category: category.map(str::to_string),
            status,
            search: search.to_string(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| record.category == category);
        let status_ok = self
            .status
            .is_none_or(|status| record.status == status.as_str());
        category_ok && status_ok && self.matches_search(record)
    }

    fn matches_search(&self, record: &Record) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [
            &record.name,
            &record.usage_guidelines,
            &record.content_guidelines,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.status.is_none() && self.search.is_empty()
    }
}

/// The authoritative record list, ordered exactly like the sheet rows
///
/// Positions are indexes into this list and shift when an entry is removed.
/// Sheet rows never shift, so every entry remembers its own.
#[derive(Debug)]
pub struct RecordCache {
    entries: Vec<CachedRecord>,
    next_row: usize,
}

impl Default for RecordCache {
    fn default() -> Self {
        RecordCache {
            entries: Vec::new(),
            next_row: HEADER_OFFSET,
        }
    }
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and take the loaded records in order, each with a fresh key
    pub fn replace_all(&mut self, contents: SheetContents) {
        self.entries = contents
            .records
            .into_iter()
            .map(|entry| CachedRecord {
                key: RecordKey::new(),
                row: entry.row,
                record: entry.record,
            })
            .collect();
        self.next_row = contents.next_row;
    }

    /// Sheet row the next appended record goes to
    pub fn next_row(&self) -> usize {
        self.next_row
    }

    /// Add a record just written to sheet row `row`
    pub fn push(&mut self, row: usize, record: Record) -> RecordKey {
        let key = RecordKey::new();
        self.entries.push(CachedRecord { key, row, record });
        self.next_row = self.next_row.max(row + 1);
        key
    }

    /// Replace the record at `position`, keeping its key
    pub fn set(&mut self, position: usize, record: Record) -> Result<()> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(position)
            .ok_or(CmsError::InvalidPosition { position, len })?;
        entry.record = record;
        Ok(())
    }

    pub fn remove(&mut self, position: usize) -> Result<Record> {
        if position >= self.entries.len() {
            return Err(CmsError::InvalidPosition {
                position,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(position).record)
    }

    pub fn get(&self, position: usize) -> Option<&CachedRecord> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedRecord> {
        self.entries.iter()
    }

    /// Lazy view of the records matching `filter`, in cache order
    pub fn filter<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a CachedRecord> + 'a {
        self.entries.iter().filter(move |e| filter.matches(&e.record))
    }

    /// Current position of the record behind `key`
    pub fn position_of(&self, key: RecordKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Distinct non-empty categories in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            let category = entry.record.category.as_str();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::SheetRecord;

    fn record(name: &str, category: &str, status: &str) -> Record {
        Record {
            name: name.to_string(),
            category: category.to_string(),
            status: status.to_string(),
            ..Record::default()
        }
    }

    fn scenario() -> RecordCache {
        let mut cache = RecordCache::new();
        cache.replace_all(SheetContents {
            records: vec![
                SheetRecord {
                    row: 2,
                    record: record("Button", "Input", "Approved"),
                },
                SheetRecord {
                    row: 3,
                    record: record("Modal", "Overlay", "Draft"),
                },
            ],
            next_row: 4,
        });
        cache
    }

    fn append(cache: &mut RecordCache, record: Record) -> RecordKey {
        let row = cache.next_row();
        cache.push(row, record)
    }

    fn names<'a>(view: impl Iterator<Item = &'a CachedRecord>) -> Vec<&'a str> {
        view.map(|e| e.record.name.as_str()).collect()
    }

    #[test]
    fn category_filter_is_exact() {
        let cache = scenario();
        let filter = Filter::new(Some("Input"), None, "");
        assert_eq!(names(cache.filter(&filter)), vec!["Button"]);

        let filter = Filter::new(Some("input"), None, "");
        assert!(names(cache.filter(&filter)).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let cache = scenario();
        let filter = Filter::new(None, None, "MOD");
        assert_eq!(names(cache.filter(&filter)), vec!["Modal"]);
    }

    #[test]
    fn search_covers_guideline_fields() {
        let mut cache = scenario();
        let mut chip = record("Chip", "Input", "Review");
        chip.content_guidelines = "Keep labels to one Word".to_string();
        append(&mut cache, chip);

        let filter = Filter::new(None, None, "word");
        assert_eq!(names(cache.filter(&filter)), vec!["Chip"]);
    }

    #[test]
    fn predicates_are_conjunctive() {
        let mut cache = scenario();
        append(&mut cache, record("Select", "Input", "Draft"));

        let filter = Filter::new(Some("Input"), Some(Status::Draft), "");
        assert_eq!(names(cache.filter(&filter)), vec!["Select"]);

        let filter = Filter::new(Some("Input"), Some(Status::Draft), "button");
        assert!(names(cache.filter(&filter)).is_empty());
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let mut cache = scenario();
        append(&mut cache, record("Avatar", "Display", ""));
        let filter = Filter::default();

        assert!(filter.is_empty());
        assert_eq!(names(cache.filter(&filter)), vec!["Button", "Modal", "Avatar"]);
    }

    #[test]
    fn keys_resolve_to_current_positions() {
        let mut cache = scenario();
        let tabs = append(&mut cache, record("Tabs", "Navigation", "Draft"));
        assert_eq!(cache.position_of(tabs), Some(2));

        cache.remove(0).unwrap();
        assert_eq!(cache.position_of(tabs), Some(1));

        let filter = Filter::new(Some("Navigation"), None, "");
        let key = cache.filter(&filter).next().map(|e| e.key).unwrap();
        assert_eq!(cache.position_of(key), Some(1));
    }

    #[test]
    fn rows_survive_removal_and_appends_go_past_the_last_row() {
        let mut cache = scenario();
        let tabs = append(&mut cache, record("Tabs", "Navigation", "Draft"));
        assert_eq!(cache.get(2).unwrap().row, 4);

        cache.remove(0).unwrap();
        let position = cache.position_of(tabs).unwrap();
        assert_eq!(position, 1);
        assert_eq!(cache.get(position).unwrap().row, 4);
        assert_eq!(cache.get(0).unwrap().row, 3);
        assert_eq!(cache.next_row(), 5);

        append(&mut cache, record("Chip", "Input", "Draft"));
        assert_eq!(cache.get(2).unwrap().row, 5);
    }

    #[test]
    fn keys_parse_back_from_their_text() {
        let cache = scenario();
        let key = cache.get(1).unwrap().key;
        assert_eq!(key.to_string().parse::<RecordKey>().unwrap(), key);
        assert!("not-a-key".parse::<RecordKey>().is_err());
    }

    #[test]
    fn empty_cache_appends_under_the_header() {
        let mut cache = RecordCache::new();
        assert_eq!(cache.next_row(), HEADER_OFFSET);
        cache.replace_all(SheetContents::default());
        assert_eq!(cache.next_row(), HEADER_OFFSET);
    }

    #[test]
    fn set_keeps_the_key_and_rejects_bad_positions() {
        let mut cache = scenario();
        let key = cache.get(1).unwrap().key;
        cache.set(1, record("Dialog", "Overlay", "Review")).unwrap();

        assert_eq!(cache.get(1).unwrap().key, key);
        assert_eq!(cache.get(1).unwrap().record.name, "Dialog");
        assert!(matches!(
            cache.set(5, Record::default()),
            Err(CmsError::InvalidPosition { position: 5, len: 2 })
        ));
        assert!(cache.remove(2).is_err());
    }

    #[test]
    fn categories_are_distinct_in_first_seen_order() {
        let mut cache = scenario();
        append(&mut cache, record("Select", "Input", ""));
        append(&mut cache, record("Nameless category", "", ""));
        assert_eq!(cache.categories(), vec!["Input", "Overlay"]);
    }
}
