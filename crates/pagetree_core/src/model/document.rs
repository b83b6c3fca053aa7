//! Document domain model.
//!
//! # Responsibility
//! - Define the canonical document record stored per owner.
//! - Define the insert and partial-update shapes used by the store.
//!
//! # Invariants
//! - `id` is stable and never reused for another document.
//! - `owner_id` is set at creation and never patched.
//! - `parent_document` is a convention, not a foreign key; it may dangle
//!   after the parent is removed.
//! - `is_archived` is the source of truth for trash state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one document.
pub type DocumentId = Uuid;

/// One node in an owner's document forest.
///
/// Field names serialize in camelCase to match the record shape exposed to
/// web clients (`parentDocument`, `isArchived`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    /// Subject of the identity that created the document.
    pub owner_id: String,
    pub title: String,
    /// `None` means root-level document.
    pub parent_document: Option<DocumentId>,
    /// Opaque rich-text payload; never inspected by core.
    pub content: Option<String>,
    pub icon: Option<String>,
    pub cover_image: Option<String>,
    /// Trash marker; set and cleared across whole subtrees.
    pub is_archived: bool,
    pub is_published: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms timestamp of the last patch.
    pub updated_at: i64,
}

impl Document {
    /// Whether any caller, authenticated or not, may read this document.
    pub fn is_publicly_visible(&self) -> bool {
        self.is_published && !self.is_archived
    }

    pub fn is_root(&self) -> bool {
        self.parent_document.is_none()
    }
}

/// Insert request for a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub id: DocumentId,
    pub owner_id: String,
    pub title: String,
    pub parent_document: Option<DocumentId>,
}

impl NewDocument {
    /// Builds an insert request with a freshly generated id.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        parent_document: Option<DocumentId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            title: title.into(),
            parent_document,
        }
    }
}

/// Partial update of caller-editable fields.
///
/// `None` leaves a field untouched. For optional fields, `Some(None)` clears
/// the stored value and `Some(Some(v))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub is_published: Option<bool>,
}

impl DocumentPatch {
    /// Whether the patch would leave every field untouched.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.cover_image.is_none()
            && self.icon.is_none()
            && self.is_published.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentPatch};
    use uuid::Uuid;

    fn sample() -> Document {
        Document {
            id: Uuid::new_v4(),
            owner_id: "user_1".to_string(),
            title: "Draft".to_string(),
            parent_document: None,
            content: Some("{}".to_string()),
            icon: Some("📄".to_string()),
            cover_image: None,
            is_archived: false,
            is_published: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn public_visibility_requires_published_and_not_archived() {
        let mut doc = sample();
        assert!(!doc.is_publicly_visible());
        doc.is_published = true;
        assert!(doc.is_publicly_visible());
        doc.is_archived = true;
        assert!(!doc.is_publicly_visible());
    }

    #[test]
    fn patch_is_empty_only_without_fields() {
        assert!(DocumentPatch::default().is_empty());
        let clear_icon = DocumentPatch {
            icon: Some(None),
            ..DocumentPatch::default()
        };
        assert!(!clear_icon.is_empty());
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let mut doc = sample();
        doc.parent_document = Some(Uuid::new_v4());
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("parentDocument").is_some());
        assert!(value.get("isArchived").is_some());
        assert!(value.get("coverImage").is_some());
        assert!(value.get("ownerId").is_some());
    }
}
