//! Deciding which protocol operation to run from conversational input.
//!
//! Two strategies share the [`Operation`] output type: [`StructuredResolver`]
//! maps calls declared by the reasoning capability, [`HeuristicResolver`]
//! pattern-matches free text.

pub mod heuristic;
pub mod structured;

pub use heuristic::{HeuristicMatch, HeuristicResolver};
pub use structured::StructuredResolver;

use crate::error::ProbeError;
use crate::types::Operation;

/// Outcome of resolving one declared call.
#[derive(Debug)]
pub enum Resolution {
    Resolved(Operation),
    /// The declaration exists but the arguments do not fit its shape.
    Invalid(ProbeError),
    /// No declaration has this name.
    Unrecognized,
}
