//! Gist reporter - periodic JSONL result aggregation
//!
//! Worker processes drop `*.jsonl` result files into a local directory. The
//! reporter periodically merges them into one `results.jsonl` entry of a
//! GitHub gist and deletes the local files once the upload is confirmed.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Flag/environment configuration
//! - [`sync`] - Scan, stage, merge, upload and cleanup pipeline
//! - [`remote`] - Remote document stores (gist API, in-memory)
//! - [`scheduler`] - Interval task and shutdown flush
//! - [`producer`] - Demo result writer
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod producer;
pub mod remote;
pub mod scheduler;
pub mod sync;

pub use error::{Error, Result};
