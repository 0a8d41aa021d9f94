//! Running the external selector.
//!
//! Everything here touches the outside world: child processes and the
//! terminal.  The pure line mapping lives in [`crate::core`].

pub mod bridge;
pub mod process;
pub mod terminal;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{Selection, Selector};
