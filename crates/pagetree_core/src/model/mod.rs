//! Domain model for the document tree.
//!
//! # Responsibility
//! - Define the document record and its partial-update shape.
//! - Define the caller identity passed into every operation.
//!
//! # Invariants
//! - Every document is identified by a stable `DocumentId`.
//! - Every document has exactly one owner, fixed at creation.

pub mod document;
pub mod identity;
