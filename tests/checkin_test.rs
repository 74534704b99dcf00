// Check-in behaviour against a real SQLite database
//
// Covers:
// 1. Find-or-create identity by instance name
// 2. Full overwrite of net/raw payload and monotonic last_seen
// 3. Membership resolution through groups, dedup and empty membership
// 4. The WebServers / alice / web01 walkthrough

mod helpers;

use helpers::{GroupBuilder, TestDb, UserBuilder};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::{json, Value};
use yoked::admin;
use yoked::checkin::{check_in, CheckIn};
use yoked::entities::{instance, user};
use yoked::errors::YokedError;
use yoked::storage;

fn request(name: &str, net: Value) -> CheckIn {
    let payload = json!({ "system": { "name": name, "net": net } });
    CheckIn::from_payload(payload).expect("valid payload")
}

async fn instances_named(db: &sea_orm::DatabaseConnection, name: &str) -> u64 {
    instance::Entity::find()
        .filter(instance::Column::Name.eq(name))
        .count(db)
        .await
        .expect("count failed")
}

#[tokio::test]
async fn test_repeated_check_in_keeps_one_instance() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let first = check_in(db, request("web01", json!({"ip": "10.0.0.1"})))
        .await
        .expect("first check-in failed");
    assert!(first.created);

    for _ in 0..4 {
        let again = check_in(db, request("web01", json!({"ip": "10.0.0.1"})))
            .await
            .expect("check-in failed");
        assert!(!again.created);
        assert_eq!(again.instance_id, first.instance_id);
    }

    assert_eq!(instances_named(db, "web01").await, 1);
}

#[tokio::test]
async fn test_second_check_in_overwrites_net_and_advances_last_seen() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let first = check_in(db, request("web01", json!({"ip": "10.0.0.1", "mac": "aa:bb"})))
        .await
        .unwrap();
    let before = storage::get_instance(db, first.instance_id)
        .await
        .unwrap()
        .unwrap();

    check_in(db, request("web01", json!({"ip": "10.0.0.2"})))
        .await
        .unwrap();
    let after = storage::get_instance(db, first.instance_id)
        .await
        .unwrap()
        .unwrap();

    // No merge: the mac from the first call is gone
    assert_eq!(after.net, Some(json!({"ip": "10.0.0.2"})));
    assert!(after.last_seen > before.last_seen);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(
        after.raw_payload,
        Some(json!({"system": {"name": "web01", "net": {"ip": "10.0.0.2"}}}))
    );
}

#[tokio::test]
async fn test_omitted_net_clears_stored_net() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let first = check_in(db, request("web01", json!({"ip": "10.0.0.1"})))
        .await
        .unwrap();
    let bare = CheckIn::from_payload(json!({"system": {"name": "web01"}})).unwrap();
    check_in(db, bare).await.unwrap();

    let stored = storage::get_instance(db, first.instance_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.net, None);
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let result = check_in(db, request("   ", json!({}))).await;
    assert!(matches!(result, Err(YokedError::InvalidRequest(_))));
    assert_eq!(instance::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_instance_without_groups_gets_no_users() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    // A user exists, but nothing links it to this host
    UserBuilder::new("alice").create(db).await;

    let outcome = check_in(db, request("lonely", json!({}))).await.unwrap();
    assert!(outcome.users.is_empty());
}

#[tokio::test]
async fn test_user_in_two_groups_appears_once() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let registered = check_in(db, request("web01", json!({}))).await.unwrap();
    let alice = UserBuilder::new("alice").create(db).await;
    let bob = UserBuilder::new("bob").with_shell("zsh").admin().create(db).await;

    GroupBuilder::new("WebServers")
        .with_user(&alice)
        .with_user(&bob)
        .with_instance(registered.instance_id)
        .create(db)
        .await;
    GroupBuilder::new("Everyone")
        .with_user(&alice)
        .with_instance(registered.instance_id)
        .create(db)
        .await;

    let outcome = check_in(db, request("web01", json!({}))).await.unwrap();

    assert_eq!(outcome.users.len(), 2);
    assert_eq!(outcome.users["alice"].shell, "/bin/bash");
    assert_eq!(outcome.users["bob"].shell, "/usr/bin/zsh");
    assert_eq!(outcome.users["bob"].access, "admin");
}

#[tokio::test]
async fn test_users_only_from_own_groups() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let web = check_in(db, request("web01", json!({}))).await.unwrap();
    let dbhost = check_in(db, request("db01", json!({}))).await.unwrap();
    let alice = UserBuilder::new("alice").create(db).await;
    let dora = UserBuilder::new("dora").create(db).await;

    GroupBuilder::new("WebServers")
        .with_user(&alice)
        .with_instance(web.instance_id)
        .create(db)
        .await;
    GroupBuilder::new("DbServers")
        .with_user(&dora)
        .with_instance(dbhost.instance_id)
        .create(db)
        .await;

    let outcome = check_in(db, request("db01", json!({}))).await.unwrap();
    assert_eq!(outcome.users.keys().collect::<Vec<_>>(), vec!["dora"]);
}

#[tokio::test]
async fn test_incomplete_user_fails_check_in() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let registered = check_in(db, request("web01", json!({}))).await.unwrap();
    let alice = UserBuilder::new("alice").create(db).await;
    GroupBuilder::new("WebServers")
        .with_user(&alice)
        .with_instance(registered.instance_id)
        .create(db)
        .await;

    // Strip the shell behind the service's back
    let model = user::Entity::find_by_id(alice.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: user::ActiveModel = model.into();
    active.shell_id = Set(None);
    active.update(db).await.unwrap();

    let result = check_in(db, request("web01", json!({"ip": "10.0.0.9"}))).await;
    assert!(matches!(
        result,
        Err(YokedError::IncompleteUserRecord { ref username, missing: "shell" }) if username == "alice"
    ));

    // The upsert itself was committed before resolution
    let stored = storage::get_instance(db, registered.instance_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.net, Some(json!({"ip": "10.0.0.9"})));
    assert_eq!(
        stored.raw_payload,
        Some(json!({"system": {"name": "web01", "net": {"ip": "10.0.0.9"}}}))
    );
}

#[tokio::test]
async fn test_name_is_trimmed_before_lookup() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let first = check_in(db, request("web01", json!({}))).await.unwrap();
    let padded = check_in(db, request("  web01\n", json!({}))).await.unwrap();

    assert!(!padded.created);
    assert_eq!(padded.instance_id, first.instance_id);
    assert_eq!(instances_named(db, "web01").await, 1);

    let fresh = check_in(db, request(" db01 ", json!({}))).await.unwrap();
    let stored = storage::get_instance(db, fresh.instance_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "db01");
}

#[tokio::test]
async fn test_webservers_walkthrough() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    // Group, user and membership
    let alice = UserBuilder::new("alice")
        .with_name("Alice Example")
        .with_key("ssh-ed25519 AAAAC3Nz alice@laptop")
        .create(db)
        .await;
    let group = GroupBuilder::new("WebServers").with_user(&alice).create(db).await;

    // First contact registers the host; attach it to the group
    let first = check_in(db, request("web01", json!({"ip": "10.0.0.1"})))
        .await
        .unwrap();
    admin::add_instance_to_group(db, group.id, first.instance_id)
        .await
        .expect("Failed to attach instance");

    let outcome = check_in(db, request("web01", json!({"ip": "10.0.0.1"})))
        .await
        .unwrap();
    let projected = serde_json::to_value(&outcome.users).unwrap();
    assert_eq!(
        projected,
        json!({
            "alice": {
                "name": "Alice Example",
                "username": "alice",
                "shell": "/bin/bash",
                "email": "alice@example.com",
                "access": "user",
                "ssh_pub_key": "ssh-ed25519 AAAAC3Nz alice@laptop"
            }
        })
    );

    // Deleting the group empties the provisioning set
    admin::delete_group(db, group.id).await.unwrap();
    let outcome = check_in(db, request("web01", json!({"ip": "10.0.0.2"})))
        .await
        .unwrap();
    assert!(outcome.users.is_empty());
    assert_eq!(outcome.instance_id, first.instance_id);
}
