use crate::entities::{access, group, group_instance, group_user, instance, role, shell, user};
use crate::errors::YokedError;
use crate::settings::Database as DbCfg;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A user together with the shell and access rows it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user: user::Model,
    pub shell: Option<shell::Model>,
    pub access: Option<access::Model>,
}

/// A group and every user linked to it, users ordered by id.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRoster {
    pub group: group::Model,
    pub members: Vec<UserRecord>,
}

#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub username: String,
    pub email: String,
    pub ssh_public_key: Option<String>,
    pub shell_id: i32,
    pub access_id: i32,
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, YokedError> {
    let db = Database::connect(&cfg.url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

// Instance functions

/// Lowest id wins when racing check-ins left duplicate names behind.
pub async fn find_instance_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<instance::Model>, YokedError> {
    use instance::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::Name.eq(name))
        .order_by_asc(Column::Id)
        .one(db)
        .await?)
}

pub async fn get_instance<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<instance::Model>, YokedError> {
    Ok(instance::Entity::find_by_id(id).one(db).await?)
}

pub async fn insert_instance<C: ConnectionTrait>(
    db: &C,
    name: &str,
    net: Value,
    raw_payload: Value,
    now: i64,
) -> Result<instance::Model, YokedError> {
    let model = instance::ActiveModel {
        instance_id: Set(None),
        name: Set(name.to_string()),
        role: Set("Unknown".to_string()),
        net: Set(json_column(net)),
        created_at: Set(now),
        last_seen: Set(now),
        raw_payload: Set(json_column(raw_payload)),
        ..Default::default()
    };

    Ok(model.insert(db).await?)
}

/// Overwrite the check-in fields of an existing instance.
pub async fn overwrite_instance<C: ConnectionTrait>(
    db: &C,
    existing: instance::Model,
    net: Value,
    raw_payload: Value,
    last_seen: i64,
) -> Result<instance::Model, YokedError> {
    let mut active: instance::ActiveModel = existing.into();
    active.net = Set(json_column(net));
    active.last_seen = Set(last_seen);
    active.raw_payload = Set(json_column(raw_payload));

    Ok(active.update(db).await?)
}

pub async fn list_instances_with_groups<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<(instance::Model, Vec<group::Model>)>, YokedError> {
    let mut rows = instance::Entity::find()
        .order_by_asc(instance::Column::Id)
        .find_with_related(group::Entity)
        .all(db)
        .await?;

    for (_, groups) in rows.iter_mut() {
        groups.sort_by_key(|g| g.id);
    }
    Ok(rows)
}

pub async fn groups_of_instance<C: ConnectionTrait>(
    db: &C,
    instance: &instance::Model,
) -> Result<Vec<group::Model>, YokedError> {
    let mut groups = instance.find_related(group::Entity).all(db).await?;
    groups.sort_by_key(|g| g.id);
    Ok(groups)
}

pub async fn instance_group_ids<C: ConnectionTrait>(
    db: &C,
    instance_id: i32,
) -> Result<Vec<i32>, YokedError> {
    use group_instance::{Column, Entity};

    Ok(Entity::find()
        .select_only()
        .column(Column::GroupId)
        .filter(Column::InstanceId.eq(instance_id))
        .order_by_asc(Column::GroupId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

// Group functions

pub async fn create_group<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<group::Model, YokedError> {
    let model = group::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn get_group<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<group::Model>, YokedError> {
    Ok(group::Entity::find_by_id(id).one(db).await?)
}

/// Delete a group and its membership links. Users and instances are untouched.
pub async fn delete_group<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, YokedError> {
    group_user::Entity::delete_many()
        .filter(group_user::Column::GroupId.eq(id))
        .exec(db)
        .await?;
    group_instance::Entity::delete_many()
        .filter(group_instance::Column::GroupId.eq(id))
        .exec(db)
        .await?;

    let result = group::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Load rosters for the given groups with a fixed number of queries.
pub async fn load_rosters<C: ConnectionTrait>(
    db: &C,
    group_ids: &[i32],
) -> Result<Vec<GroupRoster>, YokedError> {
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = group::Entity::find().filter(group::Column::Id.is_in(group_ids.iter().copied()));
    collect_rosters(db, query).await
}

pub async fn load_all_rosters<C: ConnectionTrait>(db: &C) -> Result<Vec<GroupRoster>, YokedError> {
    collect_rosters(db, group::Entity::find()).await
}

async fn collect_rosters<C: ConnectionTrait>(
    db: &C,
    query: Select<group::Entity>,
) -> Result<Vec<GroupRoster>, YokedError> {
    let rows = query
        .order_by_asc(group::Column::Id)
        .find_with_related(user::Entity)
        .all(db)
        .await?;

    let all_users: Vec<user::Model> = rows
        .iter()
        .flat_map(|(_, users)| users.iter().cloned())
        .collect();
    let (shells, access) = load_refs(db, &all_users).await?;

    Ok(rows
        .into_iter()
        .map(|(group, mut users)| {
            users.sort_by_key(|u| u.id);
            let members = users
                .into_iter()
                .map(|u| attach(u, &shells, &access))
                .collect();
            GroupRoster { group, members }
        })
        .collect())
}

async fn load_refs<C: ConnectionTrait>(
    db: &C,
    users: &[user::Model],
) -> Result<(HashMap<i32, shell::Model>, HashMap<i32, access::Model>), YokedError> {
    let shell_ids: HashSet<i32> = users.iter().filter_map(|u| u.shell_id).collect();
    let access_ids: HashSet<i32> = users.iter().filter_map(|u| u.access_id).collect();

    let shells = if shell_ids.is_empty() {
        HashMap::new()
    } else {
        shell::Entity::find()
            .filter(shell::Column::Id.is_in(shell_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect()
    };

    let access = if access_ids.is_empty() {
        HashMap::new()
    } else {
        access::Entity::find()
            .filter(access::Column::Id.is_in(access_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect()
    };

    Ok((shells, access))
}

fn attach(
    user: user::Model,
    shells: &HashMap<i32, shell::Model>,
    access: &HashMap<i32, access::Model>,
) -> UserRecord {
    let shell = user.shell_id.and_then(|id| shells.get(&id).cloned());
    let access = user.access_id.and_then(|id| access.get(&id).cloned());
    UserRecord {
        user,
        shell,
        access,
    }
}

// User functions

pub async fn insert_user<C: ConnectionTrait>(
    db: &C,
    input: NewUserRecord,
) -> Result<user::Model, YokedError> {
    let model = user::ActiveModel {
        name: Set(input.name),
        username: Set(input.username),
        email: Set(input.email),
        ssh_public_key: Set(input.ssh_public_key),
        shell_id: Set(Some(input.shell_id)),
        access_id: Set(Some(input.access_id)),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn get_user<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<user::Model>, YokedError> {
    Ok(user::Entity::find_by_id(id).one(db).await?)
}

pub async fn get_user_record<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<UserRecord>, YokedError> {
    let Some(user) = get_user(db, id).await? else {
        return Ok(None);
    };
    let users = [user];
    let (shells, access) = load_refs(db, &users).await?;
    let [user] = users;
    Ok(Some(attach(user, &shells, &access)))
}

pub async fn find_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>, YokedError> {
    use user::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::Username.eq(username))
        .order_by_asc(Column::Id)
        .one(db)
        .await?)
}

pub async fn list_user_records<C: ConnectionTrait>(db: &C) -> Result<Vec<UserRecord>, YokedError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    let (shells, access) = load_refs(db, &users).await?;

    Ok(users
        .into_iter()
        .map(|u| attach(u, &shells, &access))
        .collect())
}

pub async fn save_user<C: ConnectionTrait>(
    db: &C,
    active: user::ActiveModel,
) -> Result<user::Model, YokedError> {
    Ok(active.update(db).await?)
}

/// Delete a user and its group links.
pub async fn delete_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, YokedError> {
    group_user::Entity::delete_many()
        .filter(group_user::Column::UserId.eq(id))
        .exec(db)
        .await?;

    let result = user::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

// Membership links

pub async fn link_user<C: ConnectionTrait>(
    db: &C,
    group_id: i32,
    user_id: i32,
) -> Result<(), YokedError> {
    use group_user::{Column, Entity};

    let link = group_user::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
    };
    Entity::insert(link)
        .on_conflict(
            OnConflict::columns([Column::GroupId, Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
    Ok(())
}

pub async fn unlink_user<C: ConnectionTrait>(
    db: &C,
    group_id: i32,
    user_id: i32,
) -> Result<bool, YokedError> {
    let result = group_user::Entity::delete_by_id((group_id, user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn link_instance<C: ConnectionTrait>(
    db: &C,
    group_id: i32,
    instance_id: i32,
) -> Result<(), YokedError> {
    use group_instance::{Column, Entity};

    let link = group_instance::ActiveModel {
        group_id: Set(group_id),
        instance_id: Set(instance_id),
    };
    Entity::insert(link)
        .on_conflict(
            OnConflict::columns([Column::GroupId, Column::InstanceId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
    Ok(())
}

pub async fn unlink_instance<C: ConnectionTrait>(
    db: &C,
    group_id: i32,
    instance_id: i32,
) -> Result<bool, YokedError> {
    let result = group_instance::Entity::delete_by_id((group_id, instance_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

// Reference data

pub async fn find_shell_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<shell::Model>, YokedError> {
    Ok(shell::Entity::find()
        .filter(shell::Column::Name.eq(name))
        .order_by_asc(shell::Column::Id)
        .one(db)
        .await?)
}

pub async fn create_shell<C: ConnectionTrait>(
    db: &C,
    name: &str,
    path: &str,
) -> Result<shell::Model, YokedError> {
    let model = shell::ActiveModel {
        name: Set(name.to_string()),
        path: Set(path.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn find_access_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<access::Model>, YokedError> {
    Ok(access::Entity::find()
        .filter(access::Column::Name.eq(name))
        .order_by_asc(access::Column::Id)
        .one(db)
        .await?)
}

pub async fn create_access<C: ConnectionTrait>(
    db: &C,
    name: &str,
    description: &str,
) -> Result<access::Model, YokedError> {
    let model = access::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn find_role_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<role::Model>, YokedError> {
    Ok(role::Entity::find()
        .filter(role::Column::Name.eq(name))
        .one(db)
        .await?)
}

pub async fn create_role<C: ConnectionTrait>(
    db: &C,
    name: &str,
    description: &str,
) -> Result<role::Model, YokedError> {
    let model = role::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn list_roles<C: ConnectionTrait>(db: &C) -> Result<Vec<role::Model>, YokedError> {
    Ok(role::Entity::find()
        .order_by_asc(role::Column::Id)
        .all(db)
        .await?)
}

// JSON `null` is stored as SQL NULL so it reads back unchanged.
fn json_column(value: Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}
