//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into caller-facing document operations.
//! - Keep API/CLI layers decoupled from storage details.

pub mod document_service;
