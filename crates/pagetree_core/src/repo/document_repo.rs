//! Document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide get/insert/patch/delete by id over the `documents` table.
//! - Provide owner-scoped scans by `(owner)` and `(owner, parent)`.
//! - Apply multi-record cascades (archive flag flips, subtree deletes) in
//!   one SQLite transaction.
//!
//! # Invariants
//! - Listings are ordered most recent first: `created_at DESC, rowid DESC`.
//! - `owner_id` is written once at insert and never patched.
//! - Repository methods never check ownership; the service layer does.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::document::{Document, DocumentId, DocumentPatch, NewDocument};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    parent_document,
    content,
    icon,
    cover_image,
    is_archived,
    is_published,
    created_at,
    updated_at
FROM documents";

const RECENCY_ORDER_SQL: &str = "ORDER BY created_at DESC, rowid DESC";

const NOW_MS_SQL: &str = "CAST(unixepoch('subsec') * 1000 AS INTEGER)";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "owner_id",
    "title",
    "parent_document",
    "content",
    "icon",
    "cover_image",
    "is_archived",
    "is_published",
    "created_at",
    "updated_at",
];

/// Result type used by document repository operations.
pub type DocumentRepoResult<T> = Result<T, DocumentRepoError>;

/// Errors from document repository operations.
#[derive(Debug)]
pub enum DocumentRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target document does not exist.
    NotFound(DocumentId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid document.
    InvalidData(String),
}

impl Display for DocumentRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "document repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
        }
    }
}

impl Error for DocumentRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DocumentRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DocumentRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Parent filter for owner-scoped listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentScope {
    /// Ignore hierarchy.
    Any,
    /// Only documents without a parent reference.
    Root,
    /// Only direct children of one document.
    Child(DocumentId),
}

/// Owner-scoped listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentListQuery {
    pub owner_id: String,
    pub parent: ParentScope,
    /// `None` returns both archived and active documents.
    pub is_archived: Option<bool>,
}

impl DocumentListQuery {
    /// All documents of one owner, regardless of hierarchy or trash state.
    pub fn for_owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            parent: ParentScope::Any,
            is_archived: None,
        }
    }

    pub fn with_parent(mut self, parent: ParentScope) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }
}

/// Archive flag flip over a root and its precomputed descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCascade {
    pub root: DocumentId,
    pub descendants: Vec<DocumentId>,
    pub is_archived: bool,
    /// Clear the root's parent link in the same write.
    pub detach_root: bool,
}

/// Repository interface for the document store.
pub trait DocumentRepository {
    /// Inserts one document as active and unpublished.
    fn insert_document(&self, document: &NewDocument) -> DocumentRepoResult<Document>;
    /// Loads one document by id.
    fn get_document(&self, id: DocumentId) -> DocumentRepoResult<Option<Document>>;
    /// Patches caller-editable fields of one document.
    fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> DocumentRepoResult<()>;
    /// Permanently deletes one document. Children are left untouched.
    fn delete_document(&self, id: DocumentId) -> DocumentRepoResult<()>;
    /// Permanently deletes many documents atomically; returns rows removed.
    fn delete_documents(&self, ids: &[DocumentId]) -> DocumentRepoResult<usize>;
    /// Lists documents matching an owner-scoped query, most recent first.
    fn list_documents(&self, query: &DocumentListQuery) -> DocumentRepoResult<Vec<Document>>;
    /// Lists ids of direct children of `parent` owned by `owner_id`, in any
    /// trash state.
    fn list_child_ids(
        &self,
        owner_id: &str,
        parent: DocumentId,
    ) -> DocumentRepoResult<Vec<DocumentId>>;
    /// Applies an archive flag flip atomically; returns rows changed.
    fn apply_archive_cascade(&self, cascade: &ArchiveCascade) -> DocumentRepoResult<usize>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Creates repository from a migrated connection.
    ///
    /// # Errors
    /// - Returns schema errors when the connection was not opened through
    ///   `db::open_db*` or migrations are incomplete.
    pub fn try_new(conn: &'conn Connection) -> DocumentRepoResult<Self> {
        ensure_document_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn insert_document(&self, document: &NewDocument) -> DocumentRepoResult<Document> {
        self.conn.execute(
            "INSERT INTO documents (
                id,
                owner_id,
                title,
                parent_document,
                is_archived,
                is_published
            ) VALUES (?1, ?2, ?3, ?4, 0, 0);",
            params![
                document.id.to_string(),
                document.owner_id.as_str(),
                document.title.as_str(),
                document.parent_document.map(|value| value.to_string()),
            ],
        )?;
        self.get_document(document.id)?
            .ok_or(DocumentRepoError::NotFound(document.id))
    }

    fn get_document(&self, id: DocumentId) -> DocumentRepoResult<Option<Document>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }
        Ok(None)
    }

    fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> DocumentRepoResult<()> {
        let mut assignments: Vec<String> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            assignments.push("title = ?".to_string());
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = &patch.content {
            assignments.push("content = ?".to_string());
            bind_values.push(optional_text(content));
        }
        if let Some(cover_image) = &patch.cover_image {
            assignments.push("cover_image = ?".to_string());
            bind_values.push(optional_text(cover_image));
        }
        if let Some(icon) = &patch.icon {
            assignments.push("icon = ?".to_string());
            bind_values.push(optional_text(icon));
        }
        if let Some(is_published) = patch.is_published {
            assignments.push("is_published = ?".to_string());
            bind_values.push(Value::Integer(bool_to_int(is_published)));
        }
        assignments.push(format!("updated_at = {NOW_MS_SQL}"));
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE documents SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(DocumentRepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_document(&self, id: DocumentId) -> DocumentRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(DocumentRepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_documents(&self, ids: &[DocumentId]) -> DocumentRepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut removed = 0;
        for id in ids {
            removed += tx.execute("DELETE FROM documents WHERE id = ?1;", [id.to_string()])?;
        }
        tx.commit()?;
        Ok(removed)
    }

    fn list_documents(&self, query: &DocumentListQuery) -> DocumentRepoResult<Vec<Document>> {
        let mut sql = format!("{DOCUMENT_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.owner_id.clone())];

        match query.parent {
            ParentScope::Any => {}
            ParentScope::Root => sql.push_str(" AND parent_document IS NULL"),
            ParentScope::Child(parent) => {
                sql.push_str(" AND parent_document = ?");
                bind_values.push(Value::Text(parent.to_string()));
            }
        }

        if let Some(is_archived) = query.is_archived {
            sql.push_str(" AND is_archived = ?");
            bind_values.push(Value::Integer(bool_to_int(is_archived)));
        }

        sql.push(' ');
        sql.push_str(RECENCY_ORDER_SQL);
        sql.push(';');

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn list_child_ids(
        &self,
        owner_id: &str,
        parent: DocumentId,
    ) -> DocumentRepoResult<Vec<DocumentId>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id
             FROM documents
             WHERE owner_id = ?1
               AND parent_document = ?2
             {RECENCY_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query(params![owner_id, parent.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "documents.id")?);
        }
        Ok(ids)
    }

    fn apply_archive_cascade(&self, cascade: &ArchiveCascade) -> DocumentRepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let archived = bool_to_int(cascade.is_archived);

        let root_sql = if cascade.detach_root {
            format!(
                "UPDATE documents
                 SET is_archived = ?2,
                     parent_document = NULL,
                     updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            )
        } else {
            format!(
                "UPDATE documents
                 SET is_archived = ?2,
                     updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            )
        };
        let root_changed = tx.execute(&root_sql, params![cascade.root.to_string(), archived])?;
        if root_changed == 0 {
            // Dropping `tx` rolls back.
            return Err(DocumentRepoError::NotFound(cascade.root));
        }

        let mut changed = root_changed;
        for id in &cascade.descendants {
            // A descendant removed since discovery is skipped, not an error.
            changed += tx.execute(
                &format!(
                    "UPDATE documents
                     SET is_archived = ?2,
                         updated_at = {NOW_MS_SQL}
                     WHERE id = ?1;"
                ),
                params![id.to_string(), archived],
            )?;
        }

        tx.commit()?;
        Ok(changed)
    }
}

fn parse_document_row(row: &Row<'_>) -> DocumentRepoResult<Document> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "documents.id")?;

    let parent_document = row
        .get::<_, Option<String>>("parent_document")?
        .map(|value| parse_uuid(&value, "documents.parent_document"))
        .transpose()?;

    Ok(Document {
        id,
        owner_id: row.get("owner_id")?,
        title: row.get("title")?,
        parent_document,
        content: row.get("content")?,
        icon: row.get("icon")?,
        cover_image: row.get("cover_image")?,
        is_archived: parse_flag(row.get("is_archived")?, "documents.is_archived")?,
        is_published: parse_flag(row.get("is_published")?, "documents.is_published")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_flag(value: i64, column: &'static str) -> DocumentRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DocumentRepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> DocumentRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| DocumentRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_document_connection_ready(conn: &Connection) -> DocumentRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(DocumentRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "documents")? {
        return Err(DocumentRepoError::MissingRequiredTable("documents"));
    }

    let columns = table_columns(conn, "documents")?;
    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(DocumentRepoError::MissingRequiredColumn {
                table: "documents",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DocumentRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> DocumentRepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
