//! Association store resolution rules

mod helpers;

use helpers::*;

use orgmig_common::db::{contacts, languages, orgs};
use orgmig_mt::models::EntityKind;
use orgmig_mt::services::{AssociationStore, DestinationEntity};

async fn local_contact(db: &sqlx::SqlitePool, org_id: i64, uuid: &str) -> contacts::Contact {
    contacts::create_contact(
        db,
        org_id,
        &contacts::NewContact {
            uuid: uuid.to_string(),
            name: Some("Ann".to_string()),
            language: None,
            is_active: true,
            is_blocked: false,
            is_stopped: false,
        },
        "admin",
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_resolve_returns_destination_record() {
    let (db, org) = setup().await;
    let task = pending_task(&db, &org).await;
    let store = AssociationStore::new(db.clone());

    let ann = local_contact(&db, org.id, "uuid-ann").await;
    store.record(&task, EntityKind::Contact, 100, ann.id).await.unwrap();

    let resolved = store.resolve(EntityKind::Contact, 100, &task).await.unwrap();
    assert_eq!(resolved, Some(DestinationEntity::Contact(ann.clone())));
    assert_eq!(resolved.map(|e| e.kind()), Some(EntityKind::Contact));
}

#[tokio::test]
async fn test_missing_association_is_absent() {
    let (db, org) = setup().await;
    let task = pending_task(&db, &org).await;
    let store = AssociationStore::new(db.clone());

    assert_eq!(store.resolve(EntityKind::Contact, 404, &task).await.unwrap(), None);
}

#[tokio::test]
async fn test_kind_without_repository_is_absent() {
    let (db, org) = setup().await;
    let task = pending_task(&db, &org).await;
    let store = AssociationStore::new(db.clone());

    store.record(&task, EntityKind::Flow, 5, 1).await.unwrap();
    assert_eq!(store.lookup(&task, EntityKind::Flow, 5).await.unwrap(), Some(1));
    assert_eq!(store.resolve(EntityKind::Flow, 5, &task).await.unwrap(), None);
}

#[tokio::test]
async fn test_resolution_scoped_to_destination_org() {
    let (db, org) = setup().await;
    let other_org = orgs::create_org(&db, "Other").await.unwrap();
    let task = pending_task(&db, &org).await;
    let store = AssociationStore::new(db.clone());

    let foreign = local_contact(&db, other_org.id, "uuid-foreign").await;
    store.record(&task, EntityKind::Contact, 100, foreign.id).await.unwrap();

    assert_eq!(store.resolve(EntityKind::Contact, 100, &task).await.unwrap(), None);
}

#[tokio::test]
async fn test_newest_record_wins_and_tasks_are_isolated() {
    let (db, org) = setup().await;
    let task = pending_task(&db, &org).await;
    let other_task = pending_task(&db, &org).await;
    let store = AssociationStore::new(db.clone());

    let old = languages::create_language(&db, org.id, "English", "eng", "admin").await.unwrap();
    let new = languages::create_language(&db, org.id, "English", "eng", "admin").await.unwrap();
    store.record(&task, EntityKind::OrgLanguage, 1, old.id).await.unwrap();
    store.record(&task, EntityKind::OrgLanguage, 1, new.id).await.unwrap();

    match store.resolve(EntityKind::OrgLanguage, 1, &task).await.unwrap() {
        Some(DestinationEntity::Language(language)) => assert_eq!(language.id, new.id),
        other => panic!("expected language, got {:?}", other),
    }
    assert_eq!(store.resolve(EntityKind::OrgLanguage, 1, &other_task).await.unwrap(), None);
}

#[tokio::test]
async fn test_clear_removes_only_own_records() {
    let (db, org) = setup().await;
    let task = pending_task(&db, &org).await;
    let other_task = pending_task(&db, &org).await;
    let store = AssociationStore::new(db.clone());

    store.record(&task, EntityKind::Contact, 1, 10).await.unwrap();
    store.record(&task, EntityKind::ContactGroup, 1, 11).await.unwrap();
    store.record(&other_task, EntityKind::Contact, 1, 12).await.unwrap();

    assert_eq!(store.clear(&task).await.unwrap(), 2);
    assert_eq!(store.count(&task).await.unwrap(), 0);
    assert_eq!(store.count(&other_task).await.unwrap(), 1);
}
