//! Digital-form workflow layer: transition coordination and in-memory
//! entry aggregation.
//!
//! This crate is runtime-agnostic. All remote persistence goes through
//! the [`coordinator::FormTransitionBackend`] and [`aggregator::EntryStore`]
//! traits, injected by the caller; the HTTP implementations live in
//! `lineops-client`.

pub mod aggregator;
pub mod coordinator;
pub mod form_state;

use lineops_core::CoreError;

/// Errors crossing the workflow/persistence seam.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The remote backend rejected or failed the operation. Carries the
    /// human-readable message shown to the user.
    #[error("{0}")]
    Backend(String),

    /// A domain-level validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}
