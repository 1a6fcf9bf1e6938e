//! Core types for mcprobe.

pub mod generation;
pub mod message;
pub mod operation;
pub mod usage;

pub use generation::*;
pub use message::*;
pub use operation::*;
pub use usage::*;
