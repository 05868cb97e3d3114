//! Error types for springtail-rig.

use thiserror::Error;

/// Errors raised by the chain scheduler before any frame processes.
///
/// The scheduler is the only layer that aborts a run; geometric predicates
/// and the integrator are total. Cancellation is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpringError {
    /// Two input segments share the same name.
    #[error("duplicate segment name: {0}")]
    DuplicateSegment(String),

    /// Two input segments share the same id.
    #[error("duplicate segment id for: {0}")]
    DuplicateSegmentId(String),

    /// A segment's parent chain loops back onto itself.
    #[error("ambiguous parenting for segment: {0}")]
    AmbiguousParent(String),
}
