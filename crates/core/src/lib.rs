//! Domain model for the lineops factory-operations client.
//!
//! This crate has zero internal dependencies so it can be used by the
//! workflow layer, the HTTP client, and any future CLI tooling alike.
//! It holds the digital-form data model (forms, entries, issues, shifts,
//! attendance), the organizational hierarchy entities, and the
//! cross-cutting pagination/error/feedback types.

pub mod attendance;
pub mod entities;
pub mod entry;
pub mod error;
pub mod feedback;
pub mod form;
pub mod issue;
pub mod pagination;
pub mod shift;
pub mod types;

pub use error::CoreError;
