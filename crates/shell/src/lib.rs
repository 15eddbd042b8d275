pub mod chain;
pub mod executor;
pub mod process;
pub mod sequencer;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use executor::{ExecContext, ShellExecutor};
pub use process::ProcessExecutor;
pub use sequencer::CommandSequencer;
