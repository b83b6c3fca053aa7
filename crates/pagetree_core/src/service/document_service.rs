//! Document tree use-case service.
//!
//! # Responsibility
//! - Enforce identity and ownership rules above the repository layer.
//! - Create, update, archive, restore and remove documents.
//! - Serve sidebar, trash, search and single-document reads.
//!
//! # Invariants
//! - Every mutation requires an identity equal to the document owner.
//! - Root checks (identity, existence, ownership) run before any write.
//! - Archive and restore reach every descendant found through
//!   `(owner, parent)` scans at call time; a parent-link cycle stops the
//!   walk instead of looping.
//! - Restore detaches only the restored root from its parent.
//! - `remove` deletes one record and orphans its children.

use crate::model::document::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::model::identity::Identity;
use crate::repo::document_repo::{
    ArchiveCascade, DocumentListQuery, DocumentRepoError, DocumentRepository, ParentScope,
};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Delete strategy for `DocumentService::remove_with_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Delete the document only; children keep a dangling parent reference.
    Orphan,
    /// Delete the document and every descendant in one transaction.
    Cascade,
}

/// Errors from document service operations.
#[derive(Debug)]
pub enum DocumentServiceError {
    /// Operation requires an identity and none was supplied.
    Unauthenticated,
    /// Caller identity is not the document owner.
    Unauthorized(DocumentId),
    /// Document id does not resolve to a stored record.
    NotFound(DocumentId),
    /// Repository-level failure.
    Repo(DocumentRepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "not authenticated"),
            Self::Unauthorized(id) => write!(f, "unauthorized for document: {id}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent document state: {details}")
            }
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentRepoError> for DocumentServiceError {
    fn from(value: DocumentRepoError) -> Self {
        match value {
            DocumentRepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type DocumentServiceResult<T> = Result<T, DocumentServiceError>;

/// Document tree service facade.
pub struct DocumentService<R: DocumentRepository> {
    repo: R,
}

impl<R: DocumentRepository> DocumentService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one active, unpublished document owned by the caller.
    ///
    /// `parent_document` is stored as given; it is not checked for
    /// existence or ownership.
    pub fn create(
        &self,
        caller: Option<&Identity>,
        title: impl Into<String>,
        parent_document: Option<DocumentId>,
    ) -> DocumentServiceResult<Document> {
        let identity = require_identity(caller)?;
        let request = NewDocument::new(identity.subject(), title, parent_document);
        let document = self.repo.insert_document(&request)?;
        info!(
            "event=document_create module=document_service status=ok document_id={} has_parent={}",
            document.id,
            document.parent_document.is_some()
        );
        Ok(document)
    }

    /// Moves a document and all its descendants to trash.
    ///
    /// Calling this on an already archived tree leaves it unchanged.
    pub fn archive(&self, id: DocumentId, caller: Option<&Identity>) -> DocumentServiceResult<()> {
        let identity = require_identity(caller)?;
        let document = self.load_owned(id, identity)?;
        let descendants = self.collect_descendants(&document.owner_id, id)?;
        let changed = self.repo.apply_archive_cascade(&ArchiveCascade {
            root: id,
            descendants,
            is_archived: true,
            detach_root: false,
        })?;
        info!(
            "event=document_archive module=document_service status=ok document_id={id} changed={changed}"
        );
        Ok(())
    }

    /// Restores a document and all its descendants from trash.
    ///
    /// The restored document becomes a root; descendants keep their parent
    /// links. Returns the restored document.
    pub fn restore(
        &self,
        id: DocumentId,
        caller: Option<&Identity>,
    ) -> DocumentServiceResult<Document> {
        let identity = require_identity(caller)?;
        let document = self.load_owned(id, identity)?;
        let descendants = self.collect_descendants(&document.owner_id, id)?;
        let changed = self.repo.apply_archive_cascade(&ArchiveCascade {
            root: id,
            descendants,
            is_archived: false,
            detach_root: !document.is_root(),
        })?;
        info!(
            "event=document_restore module=document_service status=ok document_id={id} changed={changed} detached={}",
            !document.is_root()
        );
        self.repo
            .get_document(id)?
            .ok_or(DocumentServiceError::InconsistentState(
                "restored document not found in read-back",
            ))
    }

    /// Permanently deletes one document and returns its last state.
    ///
    /// Children are not deleted. They keep pointing at the removed id and
    /// no longer appear in any sidebar listing.
    pub fn remove(
        &self,
        id: DocumentId,
        caller: Option<&Identity>,
    ) -> DocumentServiceResult<Document> {
        self.remove_with_mode(id, caller, DeleteMode::Orphan)
    }

    /// Permanently deletes one document using the given strategy.
    pub fn remove_with_mode(
        &self,
        id: DocumentId,
        caller: Option<&Identity>,
        mode: DeleteMode,
    ) -> DocumentServiceResult<Document> {
        let identity = require_identity(caller)?;
        let document = self.load_owned(id, identity)?;

        let removed = match mode {
            DeleteMode::Orphan => {
                self.repo.delete_document(id)?;
                1
            }
            DeleteMode::Cascade => {
                let mut ids = vec![id];
                ids.extend(self.collect_descendants(&document.owner_id, id)?);
                self.repo.delete_documents(&ids)?
            }
        };
        info!(
            "event=document_remove module=document_service status=ok document_id={id} mode={mode:?} removed={removed}"
        );
        Ok(document)
    }

    /// Patches caller-editable fields; unspecified fields stay untouched.
    ///
    /// An empty patch is checked like any other but writes nothing, so
    /// `updated_at` is left as is.
    pub fn update(
        &self,
        id: DocumentId,
        caller: Option<&Identity>,
        patch: &DocumentPatch,
    ) -> DocumentServiceResult<()> {
        let identity = require_identity(caller)?;
        self.load_owned(id, identity)?;
        if patch.is_empty() {
            info!(
                "event=document_update module=document_service status=skipped document_id={id} reason=empty_patch"
            );
            return Ok(());
        }
        self.repo.update_document(id, patch)?;
        info!(
            "event=document_update module=document_service status=ok document_id={id} publish_change={}",
            patch.is_published.is_some()
        );
        Ok(())
    }

    /// Reads one document.
    ///
    /// Published, non-archived documents are readable by anyone, including
    /// unauthenticated callers. Everything else is owner-only.
    pub fn get_by_id(
        &self,
        id: DocumentId,
        caller: Option<&Identity>,
    ) -> DocumentServiceResult<Document> {
        let document = self
            .repo
            .get_document(id)?
            .ok_or(DocumentServiceError::NotFound(id))?;
        if document.is_publicly_visible() {
            return Ok(document);
        }

        let identity = require_identity(caller)?;
        if !identity.owns(&document.owner_id) {
            return Err(DocumentServiceError::Unauthorized(id));
        }
        Ok(document)
    }

    /// Lists active children of `parent_document` (roots when `None`).
    ///
    /// A parent that no longer exists, or belongs to someone else, has no
    /// listable children; orphans of a removed document never show up.
    pub fn list_sidebar(
        &self,
        caller: Option<&Identity>,
        parent_document: Option<DocumentId>,
    ) -> DocumentServiceResult<Vec<Document>> {
        let identity = require_identity(caller)?;
        let scope = match parent_document {
            Some(parent) => {
                let listable = self
                    .repo
                    .get_document(parent)?
                    .is_some_and(|doc| identity.owns(&doc.owner_id));
                if !listable {
                    return Ok(Vec::new());
                }
                ParentScope::Child(parent)
            }
            None => ParentScope::Root,
        };
        let query = DocumentListQuery::for_owner(identity.subject())
            .with_parent(scope)
            .with_archived(false);
        Ok(self.repo.list_documents(&query)?)
    }

    /// Lists every archived document of the caller.
    pub fn list_trash(&self, caller: Option<&Identity>) -> DocumentServiceResult<Vec<Document>> {
        let identity = require_identity(caller)?;
        let query = DocumentListQuery::for_owner(identity.subject()).with_archived(true);
        Ok(self.repo.list_documents(&query)?)
    }

    /// Lists every active document of the caller, ignoring hierarchy.
    pub fn list_searchable(
        &self,
        caller: Option<&Identity>,
    ) -> DocumentServiceResult<Vec<Document>> {
        let identity = require_identity(caller)?;
        let query = DocumentListQuery::for_owner(identity.subject()).with_archived(false);
        Ok(self.repo.list_documents(&query)?)
    }

    fn load_owned(
        &self,
        id: DocumentId,
        identity: &Identity,
    ) -> DocumentServiceResult<Document> {
        let document = self
            .repo
            .get_document(id)?
            .ok_or(DocumentServiceError::NotFound(id))?;
        if !identity.owns(&document.owner_id) {
            return Err(DocumentServiceError::Unauthorized(id));
        }
        Ok(document)
    }

    /// Depth-first walk over `(owner, parent)` links below `root`.
    ///
    /// Returns descendants in visit order, excluding `root`. Each id is
    /// visited at most once.
    fn collect_descendants(
        &self,
        owner_id: &str,
        root: DocumentId,
    ) -> DocumentServiceResult<Vec<DocumentId>> {
        let mut visited = HashSet::from([root]);
        let mut stack = vec![root];
        let mut descendants = Vec::new();

        while let Some(current) = stack.pop() {
            for child in self.repo.list_child_ids(owner_id, current)? {
                if !visited.insert(child) {
                    warn!(
                        "event=document_tree_walk module=document_service status=cycle_detected root_id={root} parent_id={current} child_id={child}"
                    );
                    continue;
                }
                descendants.push(child);
                stack.push(child);
            }
        }

        Ok(descendants)
    }
}

fn require_identity(caller: Option<&Identity>) -> DocumentServiceResult<&Identity> {
    caller.ok_or(DocumentServiceError::Unauthenticated)
}
