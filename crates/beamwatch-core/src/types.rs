use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::OffsetDateTime;

/// A complete set of pipeline outputs sharing one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactGroup {
    pub tag: String,
    /// Modification time of the summary (anchor) file.
    pub discovered_at: OffsetDateTime,
}

impl ArtifactGroup {
    pub fn new(tag: impl Into<String>, discovered_at: OffsetDateTime) -> Self {
        Self {
            tag: tag.into(),
            discovered_at,
        }
    }

    /// RFC 3339 rendering of `discovered_at`, empty if the timestamp cannot be formatted.
    pub fn discovered_at_rfc3339(&self) -> String {
        self.discovered_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default()
    }
}

// ── Layout ──

/// How the pipeline arranges a group's files inside the monitored directory.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `<tag>.json`, `<tag>.pdb`, `<tag>.mtz` side by side.
    #[default]
    Flat,
    /// `<tag>/<tag>.json`, `<tag>/<tag>_001.pdb`, `<tag>/<tag>_001.mtz`.
    Nested,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Flat => "flat",
            Layout::Nested => "nested",
        }
    }

    /// Map variant the companion should load for this layout unless configured otherwise.
    pub fn default_map_kind(self) -> MapKind {
        match self {
            Layout::Flat => MapKind::Standard,
            Layout::Nested => MapKind::Anomalous,
        }
    }

    /// Tag named by a directory entry, if the entry can name one under this layout.
    pub fn candidate_tag(self, entry_name: &str, is_dir: bool) -> Option<String> {
        match self {
            Layout::Flat => Path::new(entry_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            Layout::Nested if is_dir => Some(entry_name.to_string()),
            Layout::Nested => None,
        }
    }

    /// Resolve the required files of `tag` under `directory`. Pure, no I/O.
    pub fn paths(self, directory: &Path, tag: &str) -> ArtifactPaths {
        match self {
            Layout::Flat => ArtifactPaths {
                summary: directory.join(format!("{tag}.json")),
                model: directory.join(format!("{tag}.pdb")),
                maps: directory.join(format!("{tag}.mtz")),
            },
            Layout::Nested => {
                let group_dir = directory.join(tag);
                ArtifactPaths {
                    summary: group_dir.join(format!("{tag}.json")),
                    model: group_dir.join(format!("{tag}_001.pdb")),
                    maps: group_dir.join(format!("{tag}_001.mtz")),
                }
            }
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Layout::Flat),
            "nested" => Ok(Layout::Nested),
            other => Err(format!("unknown layout '{other}' (expected flat or nested)")),
        }
    }
}

/// Which map-loading verb the companion receives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    Standard,
    Anomalous,
}

// ── Paths ──

/// Concrete file paths of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Structured summary table; also the anchor whose mtime orders groups.
    pub summary: PathBuf,
    /// Molecular model.
    pub model: PathBuf,
    /// Reflection / map data.
    pub maps: PathBuf,
}

impl ArtifactPaths {
    pub fn anchor(&self) -> &Path {
        &self.summary
    }

    pub fn required(&self) -> [&Path; 3] {
        [&self.summary, &self.model, &self.maps]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_paths() {
        let p = Layout::Flat.paths(Path::new("/data"), "run7");
        assert_eq!(p.summary, PathBuf::from("/data/run7.json"));
        assert_eq!(p.model, PathBuf::from("/data/run7.pdb"));
        assert_eq!(p.maps, PathBuf::from("/data/run7.mtz"));
        assert_eq!(p.anchor(), Path::new("/data/run7.json"));
    }

    #[test]
    fn nested_paths() {
        let p = Layout::Nested.paths(Path::new("/data"), "run7");
        assert_eq!(p.summary, PathBuf::from("/data/run7/run7.json"));
        assert_eq!(p.model, PathBuf::from("/data/run7/run7_001.pdb"));
        assert_eq!(p.maps, PathBuf::from("/data/run7/run7_001.mtz"));
    }

    #[test]
    fn flat_tag_strips_last_extension_only() {
        assert_eq!(
            Layout::Flat.candidate_tag("a.json", false).as_deref(),
            Some("a")
        );
        assert_eq!(
            Layout::Flat.candidate_tag("lig.v2.pdb", false).as_deref(),
            Some("lig.v2")
        );
        assert_eq!(
            Layout::Flat.candidate_tag("README", false).as_deref(),
            Some("README")
        );
    }

    #[test]
    fn nested_tag_requires_directory() {
        assert_eq!(
            Layout::Nested.candidate_tag("run1", true).as_deref(),
            Some("run1")
        );
        assert_eq!(Layout::Nested.candidate_tag("run1.json", false), None);
    }

    #[test]
    fn layout_parses_and_displays() {
        assert_eq!("flat".parse::<Layout>().unwrap(), Layout::Flat);
        assert_eq!("nested".parse::<Layout>().unwrap(), Layout::Nested);
        assert!("tree".parse::<Layout>().is_err());
        assert_eq!(Layout::Nested.to_string(), "nested");
    }

    #[test]
    fn default_map_kind_follows_layout() {
        assert_eq!(Layout::Flat.default_map_kind(), MapKind::Standard);
        assert_eq!(Layout::Nested.default_map_kind(), MapKind::Anomalous);
    }

    #[test]
    fn layout_serde_snake_case() {
        let json = serde_json::to_string(&Layout::Nested).unwrap();
        assert_eq!(json, "\"nested\"");
        let kind: MapKind = serde_json::from_str("\"anomalous\"").unwrap();
        assert_eq!(kind, MapKind::Anomalous);
    }

    #[test]
    fn rfc3339_rendering() {
        let g = ArtifactGroup::new("a", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(g.discovered_at_rfc3339(), "1970-01-01T00:00:00Z");
    }
}
