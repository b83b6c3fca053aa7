//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the document store contract consumed by services.
//! - Isolate SQLite query details from tree mutation logic.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Repositories never interpret caller identity.

pub mod document_repo;
