pub mod error;
pub mod lifecycle;
pub mod session_runner;
pub mod snapshot;

pub use error::{OrchestratorError, Result};
pub use lifecycle::{BackupLifecycle, BackupReport};
pub use session_runner::{PlayReport, RestoreReport, SessionRunner};
pub use snapshot::{RestoreOutcome, Snapshot, SnapshotStore};
