//! Common utilities for quickstart
//!
//! This crate provides the error type shared by the MongoDB library and the CLI.

pub mod error;

pub use error::{QuickstartError, Result};
