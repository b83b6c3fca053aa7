use pagetree_core::db::open_db_in_memory;
use pagetree_core::{
    Document, DocumentId, DocumentService, DocumentServiceError, Identity,
    SqliteDocumentRepository,
};

fn user(subject: &str) -> Identity {
    Identity::new(subject).unwrap()
}

fn ids(documents: &[Document]) -> Vec<DocumentId> {
    documents.iter().map(|doc| doc.id).collect()
}

#[test]
fn sidebar_lists_active_children_most_recent_first() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let owner = user("user_1");

    let first = service.create(Some(&owner), "first", None).unwrap();
    let second = service.create(Some(&owner), "second", None).unwrap();
    let third = service.create(Some(&owner), "third", None).unwrap();
    let nested = service.create(Some(&owner), "nested", Some(first.id)).unwrap();
    let nested_later = service
        .create(Some(&owner), "nested later", Some(first.id))
        .unwrap();

    let roots = service.list_sidebar(Some(&owner), None).unwrap();
    assert_eq!(ids(&roots), vec![third.id, second.id, first.id]);

    let children = service.list_sidebar(Some(&owner), Some(first.id)).unwrap();
    assert_eq!(ids(&children), vec![nested_later.id, nested.id]);
}

#[test]
fn sidebar_excludes_archived_and_other_owners() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let owner = user("user_1");
    let other = user("user_2");

    let kept = service.create(Some(&owner), "kept", None).unwrap();
    let trashed = service.create(Some(&owner), "trashed", None).unwrap();
    service.create(Some(&other), "theirs", None).unwrap();
    service.archive(trashed.id, Some(&owner)).unwrap();

    let roots = service.list_sidebar(Some(&owner), None).unwrap();
    assert_eq!(ids(&roots), vec![kept.id]);
    assert!(roots.iter().all(|doc| !doc.is_archived));
}

#[test]
fn trash_lists_only_archived_documents_of_caller() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let owner = user("user_1");
    let other = user("user_2");

    let root = service.create(Some(&owner), "root", None).unwrap();
    let child = service.create(Some(&owner), "child", Some(root.id)).unwrap();
    service.create(Some(&owner), "active", None).unwrap();
    let foreign = service.create(Some(&other), "foreign", None).unwrap();
    service.archive(root.id, Some(&owner)).unwrap();
    service.archive(foreign.id, Some(&other)).unwrap();

    let trash = service.list_trash(Some(&owner)).unwrap();
    assert_eq!(ids(&trash), vec![child.id, root.id]);
    assert!(trash.iter().all(|doc| doc.is_archived));

    service.restore(root.id, Some(&owner)).unwrap();
    assert!(service.list_trash(Some(&owner)).unwrap().is_empty());
}

#[test]
fn searchable_is_flat_and_excludes_archived() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let owner = user("user_1");

    let root = service.create(Some(&owner), "root", None).unwrap();
    let child = service.create(Some(&owner), "child", Some(root.id)).unwrap();
    let grandchild = service.create(Some(&owner), "grand", Some(child.id)).unwrap();
    let trashed = service.create(Some(&owner), "trashed", None).unwrap();
    service.archive(trashed.id, Some(&owner)).unwrap();

    let searchable = service.list_searchable(Some(&owner)).unwrap();
    assert_eq!(ids(&searchable), vec![grandchild.id, child.id, root.id]);
}

#[test]
fn listings_require_identity() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.list_sidebar(None, None).unwrap_err(),
        DocumentServiceError::Unauthenticated
    ));
    assert!(matches!(
        service.list_trash(None).unwrap_err(),
        DocumentServiceError::Unauthenticated
    ));
    assert!(matches!(
        service.list_searchable(None).unwrap_err(),
        DocumentServiceError::Unauthenticated
    ));
}

#[test]
fn sidebar_under_missing_or_foreign_parent_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let owner = user("user_1");
    let other = user("user_2");

    let theirs = service.create(Some(&other), "theirs", None).unwrap();
    service
        .create(Some(&owner), "mine under theirs", Some(theirs.id))
        .unwrap();
    assert!(service
        .list_sidebar(Some(&owner), Some(theirs.id))
        .unwrap()
        .is_empty());

    let dangling = uuid::Uuid::new_v4();
    service
        .create(Some(&owner), "dangling", Some(dangling))
        .unwrap();
    assert!(service
        .list_sidebar(Some(&owner), Some(dangling))
        .unwrap()
        .is_empty());
}

#[test]
fn sidebar_hides_children_once_parent_is_archived() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(SqliteDocumentRepository::try_new(&conn).unwrap());
    let owner = user("user_1");

    let parent = service.create(Some(&owner), "parent", None).unwrap();
    let child = service.create(Some(&owner), "child", Some(parent.id)).unwrap();
    assert_eq!(
        ids(&service.list_sidebar(Some(&owner), Some(parent.id)).unwrap()),
        vec![child.id]
    );

    service.archive(parent.id, Some(&owner)).unwrap();
    assert!(service
        .list_sidebar(Some(&owner), Some(parent.id))
        .unwrap()
        .is_empty());
}
