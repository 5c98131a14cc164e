//! Command implementations.

pub mod completions;
pub mod once;
pub mod produce;
pub mod run;
pub mod version;

use crate::error::{Error, Result};

/// Create the tokio runtime used by async commands.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}
