//! Decoding of a group's structured summary file into display rows.
//!
//! The file carries two sections, data collection and refinement, optionally
//! wrapped in a `"Table 1"` object. Rows come from fixed label lists; labels
//! the file does not know about are ignored and anything missing or unusable
//! renders as [`NOT_AVAILABLE`]. Decoding never fails.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Placeholder for a value that is missing or cannot be displayed.
pub const NOT_AVAILABLE: &str = "N/A";

const TABLE_KEY: &str = "Table 1";
const COLLECTION_KEY: &str = "Data collection";
const REFINEMENT_KEY: &str = "Refinement";

const UNIT_CELL: &[&str] = &["a", "alpha", "b", "beta", "c", "gamma"];
const BY_COMPONENT: &[&str] = &["Protein", "Ligand/ion", "Water"];
const RMS: &[&str] = &["Bond lengths", "Bond angles"];
const RAMACHANDRAN: &[&str] = &["Favored", "Outliers"];

/// (label, sub-labels); empty sub-labels means a scalar row.
const COLLECTION_ROWS: &[(&str, &[&str])] = &[
    ("Space group", &[]),
    ("Cell dimensions", UNIT_CELL),
    ("Resolution", &[]),
    ("Rsplit", &[]),
    ("I/sigI", &[]),
    ("Completeness", &[]),
    ("Multiplicity (Stills)", &[]),
    ("No. collected images", &[]),
    ("No. images used", &[]),
    ("No. lattices merged", &[]),
    ("No. total reflections", &[]),
    ("CC1/2", &[]),
    ("CCiso", &[]),
    ("CC*", &[]),
    ("CCano", &[]),
    ("Wilson B factor", &[]),
];

const REFINEMENT_ROWS: &[(&str, &[&str])] = &[
    ("Resolution", &[]),
    ("Rwork / Rfree", &[]),
    ("No. atoms", BY_COMPONENT),
    ("B-factors", BY_COMPONENT),
    ("R.m.s deviations", RMS),
    ("Clashscore", &[]),
    ("Ramachandran statistics", RAMACHANDRAN),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RowValue {
    Scalar(String),
    /// Ordered (sub-label, value) pairs.
    Group(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: RowValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTable {
    pub collection: Vec<SummaryRow>,
    pub refinement: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Every row present, every value a placeholder.
    pub fn unavailable() -> Self {
        Self::from_value(&Value::Null)
    }

    /// Read and decode `path`. Unreadable or malformed files yield placeholders.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read summary");
                return Self::unavailable();
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(v) => Self::from_value(&v),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed summary");
                Self::unavailable()
            }
        }
    }

    pub fn from_value(root: &Value) -> Self {
        let table = root.get(TABLE_KEY).unwrap_or(root);
        Self {
            collection: section_rows(table.get(COLLECTION_KEY), COLLECTION_ROWS),
            refinement: section_rows(table.get(REFINEMENT_KEY), REFINEMENT_ROWS),
        }
    }

    /// Value of a scalar row, or a sub-value of a grouped row when `sub` is given.
    pub fn lookup(&self, section: Section, label: &str, sub: Option<&str>) -> Option<&str> {
        let rows = match section {
            Section::Collection => &self.collection,
            Section::Refinement => &self.refinement,
        };
        let row = rows.iter().find(|r| r.label == label)?;
        match (&row.value, sub) {
            (RowValue::Scalar(v), None) => Some(v),
            (RowValue::Group(parts), Some(sub)) => parts
                .iter()
                .find(|(k, _)| k == sub)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Collection,
    Refinement,
}

impl Section {
    pub fn heading(self) -> &'static str {
        match self {
            Section::Collection => "Data Collection",
            Section::Refinement => "Refinement",
        }
    }
}

fn section_rows(section: Option<&Value>, layout: &[(&str, &[&str])]) -> Vec<SummaryRow> {
    layout
        .iter()
        .map(|(label, subs)| {
            let raw = section.and_then(|s| s.get(*label));
            let value = if subs.is_empty() {
                RowValue::Scalar(render(raw))
            } else {
                RowValue::Group(
                    subs.iter()
                        .map(|sub| (sub.to_string(), render(raw.and_then(|r| r.get(*sub)))))
                        .collect(),
                )
            };
            SummaryRow {
                label: label.to_string(),
                value,
            }
        })
        .collect()
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_) | Value::Array(_))) => v.to_string(),
        Some(Value::Null) | Some(Value::Object(_)) | None => NOT_AVAILABLE.to_string(),
    }
}
