//! Caller-facing request/response API over the document service.
//!
//! # Responsibility
//! - Expose one function per document operation with plain string inputs.
//! - Resolve the caller identity supplied by the host's identity provider.
//! - Translate core errors into envelopes with stable error codes.
//!
//! # Invariants
//! - Exported functions never panic and never return `Err`; failures are
//!   reported inside the envelope.
//! - A missing or blank subject is treated as an unauthenticated caller.
//! - Each call opens its own connection; no state is shared between calls.

use log::warn;
use pagetree_core::db::open_db;
use pagetree_core::{
    CoreConfig, DeleteMode, Document, DocumentId, DocumentPatch, DocumentService,
    DocumentServiceError, Identity, SqliteDocumentRepository,
};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthenticated,
    Unauthorized,
    NotFound,
    InvalidArgument,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-document response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub ok: bool,
    pub document: Option<Document>,
    pub error_code: Option<ErrorCode>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

/// Listing response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub ok: bool,
    /// Most recent first; empty on failure.
    pub items: Vec<Document>,
    pub error_code: Option<ErrorCode>,
    pub message: String,
}

/// Response envelope for operations without a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub ok: bool,
    pub error_code: Option<ErrorCode>,
    pub message: String,
}

#[derive(Debug)]
struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<DocumentServiceError> for ApiError {
    fn from(value: DocumentServiceError) -> Self {
        let code = match &value {
            DocumentServiceError::Unauthenticated => ErrorCode::Unauthenticated,
            DocumentServiceError::Unauthorized(_) => ErrorCode::Unauthorized,
            DocumentServiceError::NotFound(_) => ErrorCode::NotFound,
            DocumentServiceError::Repo(_) | DocumentServiceError::InconsistentState(_) => {
                ErrorCode::Internal
            }
        };
        Self::new(code, value.to_string())
    }
}

impl DocumentResponse {
    fn from_result(op: &'static str, result: Result<Document, ApiError>, ok_message: &str) -> Self {
        match result {
            Ok(document) => Self {
                ok: true,
                document: Some(document),
                error_code: None,
                message: ok_message.to_string(),
            },
            Err(err) => {
                let message = failure_message(op, &err);
                Self {
                    ok: false,
                    document: None,
                    error_code: Some(err.code),
                    message,
                }
            }
        }
    }
}

impl DocumentListResponse {
    fn from_result(op: &'static str, result: Result<Vec<Document>, ApiError>) -> Self {
        match result {
            Ok(items) => {
                let message = if items.is_empty() {
                    "No documents.".to_string()
                } else {
                    format!("Found {} document(s).", items.len())
                };
                Self {
                    ok: true,
                    items,
                    error_code: None,
                    message,
                }
            }
            Err(err) => {
                let message = failure_message(op, &err);
                Self {
                    ok: false,
                    items: Vec::new(),
                    error_code: Some(err.code),
                    message,
                }
            }
        }
    }
}

impl ActionResponse {
    fn from_result(op: &'static str, result: Result<(), ApiError>, ok_message: &str) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                error_code: None,
                message: ok_message.to_string(),
            },
            Err(err) => {
                let message = failure_message(op, &err);
                Self {
                    ok: false,
                    error_code: Some(err.code),
                    message,
                }
            }
        }
    }
}

/// Document operations bound to one configured database.
#[derive(Debug, Clone)]
pub struct DocumentApi {
    config: CoreConfig,
}

impl DocumentApi {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Creates a document owned by `subject`, optionally under `parent_id`.
    pub fn create(
        &self,
        subject: Option<&str>,
        title: &str,
        parent_id: Option<&str>,
    ) -> DocumentResponse {
        let result = parse_optional_id(parent_id, "parent_id").and_then(|parent| {
            self.with_service(|service| {
                Ok(service.create(resolve_caller(subject).as_ref(), title, parent)?)
            })
        });
        DocumentResponse::from_result("create", result, "Document created.")
    }

    /// Moves a document and its descendants to trash.
    pub fn archive(&self, subject: Option<&str>, id: &str) -> ActionResponse {
        let result = parse_id(id, "id").and_then(|id| {
            self.with_service(|service| {
                Ok(service.archive(id, resolve_caller(subject).as_ref())?)
            })
        });
        ActionResponse::from_result("archive", result, "Document moved to trash.")
    }

    /// Restores a document and its descendants; the document becomes a root.
    pub fn restore(&self, subject: Option<&str>, id: &str) -> DocumentResponse {
        let result = parse_id(id, "id").and_then(|id| {
            self.with_service(|service| {
                Ok(service.restore(id, resolve_caller(subject).as_ref())?)
            })
        });
        DocumentResponse::from_result("restore", result, "Document restored.")
    }

    /// Permanently deletes a document. With `cascade`, descendants go too;
    /// otherwise they are orphaned.
    pub fn remove(&self, subject: Option<&str>, id: &str, cascade: bool) -> DocumentResponse {
        let mode = if cascade {
            DeleteMode::Cascade
        } else {
            DeleteMode::Orphan
        };
        let result = parse_id(id, "id").and_then(|id| {
            self.with_service(|service| {
                Ok(service.remove_with_mode(id, resolve_caller(subject).as_ref(), mode)?)
            })
        });
        DocumentResponse::from_result("remove", result, "Document deleted.")
    }

    /// Applies a partial update.
    pub fn update(&self, subject: Option<&str>, id: &str, patch: &DocumentPatch) -> ActionResponse {
        let result = parse_id(id, "id").and_then(|id| {
            self.with_service(|service| {
                Ok(service.update(id, resolve_caller(subject).as_ref(), patch)?)
            })
        });
        ActionResponse::from_result("update", result, "Document updated.")
    }

    /// Reads one document; published documents need no subject.
    pub fn get_by_id(&self, subject: Option<&str>, id: &str) -> DocumentResponse {
        let result = parse_id(id, "id").and_then(|id| {
            self.with_service(|service| {
                Ok(service.get_by_id(id, resolve_caller(subject).as_ref())?)
            })
        });
        DocumentResponse::from_result("get_by_id", result, "Document loaded.")
    }

    /// Lists active children of `parent_id`, or roots when omitted.
    pub fn list_sidebar(
        &self,
        subject: Option<&str>,
        parent_id: Option<&str>,
    ) -> DocumentListResponse {
        let result = parse_optional_id(parent_id, "parent_id").and_then(|parent| {
            self.with_service(|service| {
                Ok(service.list_sidebar(resolve_caller(subject).as_ref(), parent)?)
            })
        });
        DocumentListResponse::from_result("list_sidebar", result)
    }

    /// Lists the caller's archived documents.
    pub fn list_trash(&self, subject: Option<&str>) -> DocumentListResponse {
        let result = self.with_service(|service| {
            Ok(service.list_trash(resolve_caller(subject).as_ref())?)
        });
        DocumentListResponse::from_result("list_trash", result)
    }

    /// Lists all of the caller's active documents, flat.
    pub fn list_searchable(&self, subject: Option<&str>) -> DocumentListResponse {
        let result = self.with_service(|service| {
            Ok(service.list_searchable(resolve_caller(subject).as_ref())?)
        });
        DocumentListResponse::from_result("list_searchable", result)
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&DocumentService<SqliteDocumentRepository<'_>>) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let conn = open_db(&self.config.db_path)
            .map_err(|err| ApiError::new(ErrorCode::Internal, format!("DB open failed: {err}")))?;
        let repo = SqliteDocumentRepository::try_new(&conn).map_err(|err| {
            ApiError::new(ErrorCode::Internal, format!("repo init failed: {err}"))
        })?;
        let service = DocumentService::new(repo);
        f(&service)
    }
}

fn resolve_caller(subject: Option<&str>) -> Option<Identity> {
    subject.and_then(|value| Identity::new(value).ok())
}

fn parse_id(value: &str, field: &str) -> Result<DocumentId, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        ApiError::new(
            ErrorCode::InvalidArgument,
            format!("{field} is not a valid document id: `{value}`"),
        )
    })
}

fn parse_optional_id(value: Option<&str>, field: &str) -> Result<Option<DocumentId>, ApiError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_id(value, field).map(Some),
        None => Ok(None),
    }
}

fn failure_message(op: &'static str, err: &ApiError) -> String {
    warn!(
        "event=api_call module=api status=error op={op} error_code={}",
        err.code
    );
    format!("{op} failed: {}", err.message)
}
