//! Data models for test-case reporting.
//!
//! This module contains the core data structures used throughout the
//! application: the automation-status classification, the classified
//! snapshot report, and the per-area-path aggregate table.

use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Automation status of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationStatus {
    /// Test case has an automated execution.
    Automated,
    /// Test case is planned for automation.
    Automatable,
    /// Test case is executed manually.
    Manual,
}

impl fmt::Display for AutomationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationStatus::Automated => write!(f, "automated"),
            AutomationStatus::Automatable => write!(f, "automatable"),
            AutomationStatus::Manual => write!(f, "manual"),
        }
    }
}

impl AutomationStatus {
    /// Classify a raw automation-status field value, case-insensitively.
    ///
    /// `"automated"` maps to [`Automated`](Self::Automated) and `"planned"`
    /// to [`Automatable`](Self::Automatable). Every other value, including
    /// an empty string for work items that lack the field entirely, falls
    /// back to [`Manual`](Self::Manual).
    pub fn classify(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "automated" => AutomationStatus::Automated,
            "planned" => AutomationStatus::Automatable,
            _ => AutomationStatus::Manual,
        }
    }
}

/// A single classified test case: a human-readable label mapped to its
/// area path.
///
/// On the wire this is a single-key JSON object, e.g.
/// `{"TC1234": "/MSTeams/Foo"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseEntry {
    /// Test case label: the work item id prefixed with `TC`.
    pub label: String,
    /// Area path of the work item.
    pub area_path: String,
}

impl CaseEntry {
    /// Create an entry for a work item id and its area path.
    pub fn new(id: u64, area_path: impl Into<String>) -> Self {
        Self {
            label: format!("TC{}", id),
            area_path: area_path.into(),
        }
    }
}

impl Serialize for CaseEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.area_path)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for CaseEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = CaseEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a single-key map of test case label to area path")
            }

            fn visit_map<A>(self, mut access: A) -> Result<CaseEntry, A::Error>
            where
                A: MapAccess<'de>,
            {
                let (label, area_path) = access
                    .next_entry::<String, String>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                if access.next_entry::<String, String>()?.is_some() {
                    return Err(de::Error::custom("expected exactly one label per entry"));
                }
                Ok(CaseEntry { label, area_path })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

/// The three-way bucketed snapshot produced by a fetch.
///
/// Every fetched test case lands in exactly one of the three lists.
/// Reports are created fresh per fetch and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedReport {
    /// UTC capture timestamp, for provenance.
    pub date: DateTime<Utc>,
    /// Test cases with an automated execution.
    pub automated: Vec<CaseEntry>,
    /// Manually executed test cases (the fallback bucket).
    pub manual: Vec<CaseEntry>,
    /// Test cases planned for automation.
    pub automatable: Vec<CaseEntry>,
}

impl ClassifiedReport {
    /// Create an empty report timestamped now.
    pub fn new() -> Self {
        Self {
            date: Utc::now(),
            automated: Vec::new(),
            manual: Vec::new(),
            automatable: Vec::new(),
        }
    }

    /// Append an entry to the list for the given status.
    pub fn push(&mut self, status: AutomationStatus, entry: CaseEntry) {
        match status {
            AutomationStatus::Automated => self.automated.push(entry),
            AutomationStatus::Automatable => self.automatable.push(entry),
            AutomationStatus::Manual => self.manual.push(entry),
        }
    }

    /// Borrow the list for the given status.
    pub fn entries(&self, status: AutomationStatus) -> &[CaseEntry] {
        match status {
            AutomationStatus::Automated => &self.automated,
            AutomationStatus::Automatable => &self.automatable,
            AutomationStatus::Manual => &self.manual,
        }
    }

    /// Total number of classified test cases across all three lists.
    pub fn total(&self) -> usize {
        self.automated.len() + self.manual.len() + self.automatable.len()
    }
}

impl Default for ClassifiedReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-category counts for a single area path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub automated: u64,
    pub manual: u64,
    pub automatable: u64,
}

impl CategoryCounts {
    /// Increment the counter for the given status.
    pub fn increment(&mut self, status: AutomationStatus) {
        match status {
            AutomationStatus::Automated => self.automated += 1,
            AutomationStatus::Manual => self.manual += 1,
            AutomationStatus::Automatable => self.automatable += 1,
        }
    }

    /// Sum across all three categories.
    pub fn total(&self) -> u64 {
        self.automated + self.manual + self.automatable
    }
}

/// Per-area-path counts derived from a [`ClassifiedReport`].
///
/// Keys are area paths; a `BTreeMap` keeps row order sorted so the
/// serialized table is reproducible. Consumers must treat this as a
/// mapping, not an ordered list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTable {
    #[serde(flatten)]
    rows: BTreeMap<String, CategoryCounts>,
}

impl AggregateTable {
    /// Increment the counter for `status` under `area_path`, initializing
    /// the row to zeros on first sight.
    pub fn tally(&mut self, area_path: &str, status: AutomationStatus) {
        self.rows
            .entry(area_path.to_string())
            .or_default()
            .increment(status);
    }

    /// Look up the counts for an area path.
    pub fn get(&self, area_path: &str) -> Option<&CategoryCounts> {
        self.rows.get(area_path)
    }

    /// Iterate rows in sorted area-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryCounts)> {
        self.rows.iter()
    }

    /// Number of distinct area paths.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(
            AutomationStatus::classify("Automated"),
            AutomationStatus::Automated
        );
        assert_eq!(
            AutomationStatus::classify("AUTOMATED"),
            AutomationStatus::Automated
        );
        assert_eq!(
            AutomationStatus::classify("Planned"),
            AutomationStatus::Automatable
        );
        assert_eq!(
            AutomationStatus::classify("Not Automated"),
            AutomationStatus::Manual
        );
    }

    #[test]
    fn test_classify_empty_falls_back_to_manual() {
        assert_eq!(AutomationStatus::classify(""), AutomationStatus::Manual);
    }

    #[test]
    fn test_case_entry_label() {
        let entry = CaseEntry::new(1234, "/MSTeams/Foo");
        assert_eq!(entry.label, "TC1234");
        assert_eq!(entry.area_path, "/MSTeams/Foo");
    }

    #[test]
    fn test_case_entry_serializes_as_single_key_map() {
        let entry = CaseEntry::new(1234, "/MSTeams/Foo");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"TC1234":"/MSTeams/Foo"}"#);

        let back: CaseEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_case_entry_rejects_multi_key_map() {
        let result: Result<CaseEntry, _> = serde_json::from_str(r#"{"TC1": "/a", "TC2": "/b"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_push_and_total() {
        let mut report = ClassifiedReport::new();
        report.push(AutomationStatus::Automated, CaseEntry::new(1, "/a"));
        report.push(AutomationStatus::Manual, CaseEntry::new(2, "/a"));
        report.push(AutomationStatus::Automatable, CaseEntry::new(3, "/b"));

        assert_eq!(report.automated.len(), 1);
        assert_eq!(report.manual.len(), 1);
        assert_eq!(report.automatable.len(), 1);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = ClassifiedReport::new();
        report.push(
            AutomationStatus::Automated,
            CaseEntry::new(1234, "/MSTeams/Foo"),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("date").is_some());
        assert_eq!(
            json["automated"],
            serde_json::json!([{"TC1234": "/MSTeams/Foo"}])
        );
        assert_eq!(json["manual"], serde_json::json!([]));
        assert_eq!(json["automatable"], serde_json::json!([]));
    }

    #[test]
    fn test_category_counts_increment() {
        let mut counts = CategoryCounts::default();
        counts.increment(AutomationStatus::Automated);
        counts.increment(AutomationStatus::Manual);
        counts.increment(AutomationStatus::Manual);

        assert_eq!(counts.automated, 1);
        assert_eq!(counts.manual, 2);
        assert_eq!(counts.automatable, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_aggregate_table_sorted_rows() {
        let mut table = AggregateTable::default();
        table.tally("/z", AutomationStatus::Manual);
        table.tally("/a", AutomationStatus::Automated);
        table.tally("/m", AutomationStatus::Automatable);

        let paths: Vec<&String> = table.iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["/a", "/m", "/z"]);
    }
}
