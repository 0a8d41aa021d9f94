//! Core data – candidate tables, typed selector flags and version checks.
//!
//! Nothing in this module spawns the selector or touches the terminal.

pub mod candidate;
pub mod options;
pub mod version;
