// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for running exercise sessions.
//!
//! This module contains the command-line interface logic, including argument
//! parsing and the `run` command implementation.

// Modules
/// CLI arguments.
pub mod args;

/// Logging macros and verbosity.
pub mod logging;

/// Session runner.
#[cfg(all(feature = "onnx", feature = "video", feature = "visualize"))]
pub mod run;
