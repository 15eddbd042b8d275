pub mod config;
pub mod domain;
pub mod error;
pub mod store;

pub use config::{BackupSection, ConfigDocument, GameEntry, RunSection, DEFAULT_CONFIG_PATH};
pub use domain::*;
pub use error::{CoreError, Result};
pub use store::ProfileStore;
