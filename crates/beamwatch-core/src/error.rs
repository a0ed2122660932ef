use std::path::PathBuf;

/// Startup problems with the monitored directory. Raised once, never per tick.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("monitored directory does not exist: {}", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("monitored path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read monitored directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problems loading or validating a monitor configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
