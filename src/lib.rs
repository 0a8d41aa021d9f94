//! A typed wrapper around [fzf](https://github.com/junegunn/fzf).
//!
//! Hand [`Selector::select`] a slice of any `T` and a function that renders
//! one line per value; the user picks in fzf and you get references to the
//! chosen values back, in the order fzf printed them.
//!
//! ```no_run
//! use fzf_but_typed::{FzfOptions, Selector};
//!
//! struct Host {
//!     name: String,
//!     port: u16,
//! }
//!
//! # fn main() -> Result<(), fzf_but_typed::Error> {
//! let hosts = vec![
//!     Host { name: "build".into(), port: 22 },
//!     Host { name: "db".into(), port: 5432 },
//! ];
//!
//! let selector = Selector::new().options(FzfOptions::new().prompt("host> "));
//! match selector.select_one(&hosts, |h| format!("{}:{}", h.name, h.port))? {
//!     Some(host) => println!("connecting to {}", host.name),
//!     None => println!("cancelled"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Cancelling fzf is not an error: it yields an empty selection.

pub mod config;
pub mod core;
pub mod error;
pub mod selector;

pub use crate::config::SelectorConfig;
pub use crate::core::candidate::DuplicatePolicy;
pub use crate::core::options::{CaseMatching, FzfOptions, Layout};
pub use crate::core::version::{Compatibility, SemVer};
pub use crate::error::{Error, Result};
pub use crate::selector::{Selection, Selector};
