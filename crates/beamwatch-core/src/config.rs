use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::types::{Layout, MapKind};

/// File name picked up from the monitored directory when no config is given.
pub const CONFIG_FILE_NAME: &str = "beamwatch.json";

/// Monitor configuration. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Seconds between directory scans.
    pub interval_secs: u64,
    pub layout: Layout,
    /// Overrides the layout's default map variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_kind: Option<MapKind>,
    pub companion: CompanionConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            layout: Layout::Flat,
            map_kind: None,
            companion: CompanionConfig::default(),
        }
    }
}

/// Where the companion visualization process listens and how to launch it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompanionConfig {
    /// When false, groups are displayed but never sent to a companion.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Upper bound for every remote command.
    pub timeout_secs: u64,
    /// Upper bound for the per-tick liveness probe.
    pub probe_timeout_secs: u64,
    /// Program and arguments. Without one, an already running companion is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 40000,
            timeout_secs: 250,
            probe_timeout_secs: 5,
            command: None,
        }
    }
}

impl MonitorConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `beamwatch.json` in `directory` if present, else defaults.
    pub fn discover(path: Option<&Path>, directory: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let local = directory.join(CONFIG_FILE_NAME);
        if local.is_file() {
            tracing::debug!(path = %local.display(), "using config from monitored directory");
            return Self::load(&local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be at least 1".into()));
        }
        if self.companion.timeout_secs == 0 || self.companion.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "companion timeouts must be at least 1 second".into(),
            ));
        }
        if self.companion.host.trim().is_empty() {
            return Err(ConfigError::Invalid("companion.host is empty".into()));
        }
        if let Some(cmd) = &self.companion.command {
            if cmd.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "companion.command needs a program".into(),
                ));
            }
        }
        Ok(())
    }

    /// Map variant in effect: explicit override, else the layout default.
    pub fn effective_map_kind(&self) -> MapKind {
        self.map_kind.unwrap_or_else(|| self.layout.default_map_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_defaults() {
        let c: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c, MonitorConfig::default());
        assert_eq!(c.interval_secs, 5);
        assert_eq!(c.companion.timeout_secs, 250);
        assert!(c.companion.enabled);
    }

    #[test]
    fn partial_override() {
        let c: MonitorConfig = serde_json::from_str(
            r#"{"layout": "nested", "companion": {"port": 41234, "command": ["coot", "--no-guano"]}}"#,
        )
        .unwrap();
        assert_eq!(c.layout, Layout::Nested);
        assert_eq!(c.companion.port, 41234);
        assert_eq!(c.companion.host, "127.0.0.1");
        assert_eq!(c.effective_map_kind(), MapKind::Anomalous);
        c.validate().unwrap();
    }

    #[test]
    fn map_kind_override_wins() {
        let c = MonitorConfig {
            layout: Layout::Nested,
            map_kind: Some(MapKind::Standard),
            ..Default::default()
        };
        assert_eq!(c.effective_map_kind(), MapKind::Standard);
    }

    #[test]
    fn unknown_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, r#"{"intervall_secs": 3}"#).unwrap();
        let err = MonitorConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_interval_invalid() {
        let c = MonitorConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_command_invalid() {
        let mut c = MonitorConfig::default();
        c.companion.command = Some(vec![]);
        assert!(c.validate().is_err());
        c.companion.command = Some(vec!["coot".into()]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn discover_prefers_explicit_then_local() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            MonitorConfig::discover(None, dir.path()).unwrap(),
            MonitorConfig::default()
        );

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"interval_secs": 9}"#).unwrap();
        assert_eq!(
            MonitorConfig::discover(None, dir.path()).unwrap().interval_secs,
            9
        );

        let explicit = dir.path().join("other.json");
        std::fs::write(&explicit, r#"{"interval_secs": 2}"#).unwrap();
        assert_eq!(
            MonitorConfig::discover(Some(&explicit), dir.path())
                .unwrap()
                .interval_secs,
            2
        );
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MonitorConfig::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
