//! Bounded reason-act loop: runs, events and the loop runner.

pub mod events;
pub mod runner;
pub mod types;

pub use events::*;
pub use runner::*;
pub use types::*;
