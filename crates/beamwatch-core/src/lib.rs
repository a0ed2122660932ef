pub mod config;
pub mod error;
pub mod scan;
pub mod store;
pub mod summary;
pub mod types;

pub use error::{ConfigError, ScanError};
pub use scan::DirectoryScanner;
pub use store::ArtifactGroupStore;
pub use types::*;
