//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All human-facing output goes through this module so that quiet mode and
//! the stdout/stderr split are handled in one place.

pub mod output;
