//! Result sync pipeline.
//!
//! Merges local JSONL result files into the remote document:
//!
//! - **Scan**: list eligible `*.jsonl` files in the results directory
//! - **Stage**: download the remote entry into a local staging file
//! - **Merge**: append each result file to the staging file, in scan order
//! - **Upload**: replace the remote entry with the staging file
//! - **Cleanup**: delete merged sources (only after a confirmed upload)
//!   and the staging file
//!
//! # File Format
//!
//! Result files hold one JSON object per line, each line ending in `\n`:
//! ```json
//! {"id":1,"timestamp":"2025-01-20T10:00:00Z","value":512.3,"message":"Result #1"}
//! ```
//! The content is treated as opaque text; lines are never parsed here.
//!
//! # Example
//!
//! ```ignore
//! use reporter::remote::{Credentials, GistClient};
//! use reporter::sync::{SyncPaths, SyncPipeline};
//!
//! let pipeline = SyncPipeline::new(
//!     GistClient::new(),
//!     Credentials::new(gist_id, token),
//!     SyncPaths::new("./results"),
//! );
//! let report = pipeline.process_results().await?;
//! ```

mod file;
mod pipeline;
mod scan;
mod types;

pub use file::{
    append_file_content, append_str, atomic_write, file_size, read_file_streaming,
    remove_best_effort, STREAM_BUFFER_SIZE,
};
pub use pipeline::{SyncPaths, SyncPipeline, DEFAULT_RESULTS_DIR, STAGING_FILE_NAME};
pub use scan::{get_new_result_files, is_result_file_name, scan_result_files, ScanOutcome};
pub use types::{CycleReport, DeleteOutcome, RemoteState, RemoteStatus};
