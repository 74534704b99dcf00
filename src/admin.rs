//! Administrative operations over groups, users, instances and roles.

use crate::entities::user;
use crate::errors::YokedError;
use crate::projection::{GroupView, InstanceView, RoleView, UserView};
use crate::storage;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    /// Shell name, e.g. "bash"
    pub shell: String,
    /// Access level name, e.g. "user"
    pub access: String,
    #[serde(default)]
    pub ssh_pub_key: Option<String>,
}

/// Partial user update. Absent and empty fields both leave the stored value
/// alone, so a field cannot be cleared through an update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ssh_pub_key: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
}

fn required(field: &str, value: &str) -> Result<(), YokedError> {
    if value.trim().is_empty() {
        return Err(YokedError::InvalidRequest(format!("`{}` is required", field)));
    }
    Ok(())
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// Groups

pub async fn create_group(db: &DatabaseConnection, input: NewGroup) -> Result<GroupView, YokedError> {
    required("name", &input.name)?;
    let group = storage::create_group(db, &input.name).await?;
    tracing::info!(group_id = group.id, name = %group.name, "created group");

    Ok(GroupView {
        id: group.id,
        name: group.name,
        users: Vec::new(),
    })
}

pub async fn get_group(db: &DatabaseConnection, id: i32) -> Result<GroupView, YokedError> {
    let roster = storage::load_rosters(db, &[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| YokedError::NotFound(format!("group {}", id)))?;
    GroupView::from_roster(&roster)
}

pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<GroupView>, YokedError> {
    storage::load_all_rosters(db)
        .await?
        .iter()
        .map(GroupView::from_roster)
        .collect()
}

pub async fn delete_group(db: &DatabaseConnection, id: i32) -> Result<(), YokedError> {
    let txn = db.begin().await?;
    if !storage::delete_group(&txn, id).await? {
        return Err(YokedError::NotFound(format!("group {}", id)));
    }
    txn.commit().await?;
    tracing::info!(group_id = id, "deleted group");
    Ok(())
}

// Users

pub async fn create_user(db: &DatabaseConnection, input: NewUser) -> Result<UserView, YokedError> {
    required("name", &input.name)?;
    required("username", &input.username)?;
    required("email", &input.email)?;
    required("shell", &input.shell)?;
    required("access", &input.access)?;

    let txn = db.begin().await?;
    if storage::find_user_by_username(&txn, &input.username)
        .await?
        .is_some()
    {
        return Err(YokedError::InvalidRequest(format!(
            "username `{}` is already taken",
            input.username
        )));
    }
    let shell_id = resolve_shell(&txn, &input.shell).await?;
    let access_id = resolve_access(&txn, &input.access).await?;

    let user = storage::insert_user(
        &txn,
        storage::NewUserRecord {
            name: input.name,
            username: input.username,
            email: input.email,
            ssh_public_key: provided(input.ssh_pub_key),
            shell_id,
            access_id,
        },
    )
    .await?;
    let record = storage::get_user_record(&txn, user.id)
        .await?
        .ok_or_else(|| YokedError::NotFound(format!("user {}", user.id)))?;
    let view = UserView::from_record(&record)?;
    txn.commit().await?;

    tracing::info!(user_id = user.id, username = %user.username, "created user");
    Ok(view)
}

pub async fn get_user(db: &DatabaseConnection, id: i32) -> Result<UserView, YokedError> {
    let record = storage::get_user_record(db, id)
        .await?
        .ok_or_else(|| YokedError::NotFound(format!("user {}", id)))?;
    UserView::from_record(&record)
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<UserView>, YokedError> {
    storage::list_user_records(db)
        .await?
        .iter()
        .map(UserView::from_record)
        .collect()
}

/// Merge the non-empty fields of `input` into user `id`. An unknown shell or
/// access name rejects the whole update.
pub async fn update_user(
    db: &DatabaseConnection,
    id: i32,
    input: UserUpdate,
) -> Result<UserView, YokedError> {
    let txn = db.begin().await?;
    let existing = storage::get_user(&txn, id)
        .await?
        .ok_or_else(|| YokedError::NotFound(format!("user {}", id)))?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(name) = provided(input.name) {
        active.name = Set(name);
    }
    if let Some(email) = provided(input.email) {
        active.email = Set(email);
    }
    if let Some(key) = provided(input.ssh_pub_key) {
        active.ssh_public_key = Set(Some(key));
    }
    if let Some(shell) = provided(input.shell) {
        active.shell_id = Set(Some(resolve_shell(&txn, &shell).await?));
    }
    if let Some(access) = provided(input.access) {
        active.access_id = Set(Some(resolve_access(&txn, &access).await?));
    }

    if active.is_changed() {
        storage::save_user(&txn, active).await?;
    }
    let record = storage::get_user_record(&txn, id)
        .await?
        .ok_or_else(|| YokedError::NotFound(format!("user {}", id)))?;
    // An incomplete record rolls the update back
    let view = UserView::from_record(&record)?;
    txn.commit().await?;

    Ok(view)
}

pub async fn delete_user(db: &DatabaseConnection, id: i32) -> Result<(), YokedError> {
    let txn = db.begin().await?;
    if !storage::delete_user(&txn, id).await? {
        return Err(YokedError::NotFound(format!("user {}", id)));
    }
    txn.commit().await?;
    tracing::info!(user_id = id, "deleted user");
    Ok(())
}

async fn resolve_shell<C: ConnectionTrait>(db: &C, name: &str) -> Result<i32, YokedError> {
    storage::find_shell_by_name(db, name)
        .await?
        .map(|s| s.id)
        .ok_or_else(|| YokedError::InvalidRequest(format!("unknown shell `{}`", name)))
}

async fn resolve_access<C: ConnectionTrait>(db: &C, name: &str) -> Result<i32, YokedError> {
    storage::find_access_by_name(db, name)
        .await?
        .map(|a| a.id)
        .ok_or_else(|| YokedError::InvalidRequest(format!("unknown access level `{}`", name)))
}

// Instances

pub async fn list_instances(db: &DatabaseConnection) -> Result<Vec<InstanceView>, YokedError> {
    Ok(storage::list_instances_with_groups(db)
        .await?
        .iter()
        .map(|(inst, groups)| InstanceView::new(inst, groups))
        .collect())
}

pub async fn get_instance(db: &DatabaseConnection, id: i32) -> Result<InstanceView, YokedError> {
    let inst = storage::get_instance(db, id)
        .await?
        .ok_or_else(|| YokedError::NotFound(format!("instance {}", id)))?;
    let groups = storage::groups_of_instance(db, &inst).await?;
    Ok(InstanceView::new(&inst, &groups))
}

pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<RoleView>, YokedError> {
    Ok(storage::list_roles(db)
        .await?
        .into_iter()
        .map(RoleView::from)
        .collect())
}

// Membership

pub async fn add_user_to_group(
    db: &DatabaseConnection,
    group_id: i32,
    user_id: i32,
) -> Result<GroupView, YokedError> {
    ensure_group(db, group_id).await?;
    if storage::get_user(db, user_id).await?.is_none() {
        return Err(YokedError::NotFound(format!("user {}", user_id)));
    }
    storage::link_user(db, group_id, user_id).await?;
    get_group(db, group_id).await
}

pub async fn remove_user_from_group(
    db: &DatabaseConnection,
    group_id: i32,
    user_id: i32,
) -> Result<GroupView, YokedError> {
    ensure_group(db, group_id).await?;
    if !storage::unlink_user(db, group_id, user_id).await? {
        return Err(YokedError::NotFound(format!(
            "user {} in group {}",
            user_id, group_id
        )));
    }
    get_group(db, group_id).await
}

pub async fn add_instance_to_group(
    db: &DatabaseConnection,
    group_id: i32,
    instance_id: i32,
) -> Result<InstanceView, YokedError> {
    ensure_group(db, group_id).await?;
    if storage::get_instance(db, instance_id).await?.is_none() {
        return Err(YokedError::NotFound(format!("instance {}", instance_id)));
    }
    storage::link_instance(db, group_id, instance_id).await?;
    get_instance(db, instance_id).await
}

pub async fn remove_instance_from_group(
    db: &DatabaseConnection,
    group_id: i32,
    instance_id: i32,
) -> Result<InstanceView, YokedError> {
    ensure_group(db, group_id).await?;
    if !storage::unlink_instance(db, group_id, instance_id).await? {
        return Err(YokedError::NotFound(format!(
            "instance {} in group {}",
            instance_id, group_id
        )));
    }
    get_instance(db, instance_id).await
}

async fn ensure_group(db: &DatabaseConnection, id: i32) -> Result<(), YokedError> {
    match storage::get_group(db, id).await? {
        Some(_) => Ok(()),
        None => Err(YokedError::NotFound(format!("group {}", id))),
    }
}
