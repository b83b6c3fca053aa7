//! Core domain logic for pagetree.
//! This crate is the single source of truth for document tree invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::document::{Document, DocumentId, DocumentPatch, NewDocument};
pub use model::identity::{Identity, IdentityError};
pub use repo::document_repo::{
    ArchiveCascade, DocumentListQuery, DocumentRepoError, DocumentRepoResult,
    DocumentRepository, ParentScope, SqliteDocumentRepository,
};
pub use service::document_service::{
    DeleteMode, DocumentService, DocumentServiceError, DocumentServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
