//! Demo producer command implementation.

use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::producer::Producer;
use crate::scheduler::shutdown_signal;

/// Execute the produce command.
///
/// # Errors
///
/// Returns an error if `every` is zero or a result file cannot be written.
pub fn execute(dir: &Path, every: u64, count: Option<u64>, json: bool) -> Result<()> {
    if every == 0 {
        return Err(Error::InvalidArgument("--every must be at least 1 second".to_string()));
    }

    let rt = super::runtime()?;
    let producer = Producer::new(dir, Duration::from_secs(every)).with_limit(count);
    let written = rt.block_on(async { producer.run(shutdown_signal()).await })?;

    if json {
        let output = serde_json::json!({
            "dir": dir.display().to_string(),
            "written": written,
        });
        println!("{output}");
    } else {
        println!("Wrote {written} result files to {}", dir.display());
    }

    Ok(())
}
