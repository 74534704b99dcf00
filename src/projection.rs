use crate::entities::{group, instance, role};
use crate::errors::YokedError;
use crate::storage::{GroupRoster, UserRecord};
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account as handed to a checking-in host. Carries no database id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProjection {
    pub name: String,
    pub username: String,
    pub shell: String,
    pub email: String,
    pub access: String,
    pub ssh_pub_key: Option<String>,
}

/// Account as shown by the admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub shell: String,
    pub access: String,
    pub ssh_pub_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: i32,
    pub name: String,
    pub users: Vec<UserView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    pub id: i32,
    pub name: String,
    pub instance_id: Option<String>,
    pub net: Value,
    pub date_created: String,
    pub last_seen: String,
    pub groups: Vec<GroupRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleView {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Shell path and access name, or the field that is missing.
fn effective_refs(record: &UserRecord) -> Result<(String, String), YokedError> {
    let shell = record
        .shell
        .as_ref()
        .ok_or_else(|| YokedError::IncompleteUserRecord {
            username: record.user.username.clone(),
            missing: "shell",
        })?;
    let access = record
        .access
        .as_ref()
        .ok_or_else(|| YokedError::IncompleteUserRecord {
            username: record.user.username.clone(),
            missing: "access level",
        })?;
    Ok((shell.path.clone(), access.name.clone()))
}

impl UserProjection {
    pub fn from_record(record: &UserRecord) -> Result<Self, YokedError> {
        let (shell, access) = effective_refs(record)?;
        let user = &record.user;
        Ok(Self {
            name: user.name.clone(),
            username: user.username.clone(),
            shell,
            email: user.email.clone(),
            access,
            ssh_pub_key: user.ssh_public_key.clone(),
        })
    }
}

impl UserView {
    pub fn from_record(record: &UserRecord) -> Result<Self, YokedError> {
        let (shell, access) = effective_refs(record)?;
        let user = &record.user;
        Ok(Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            shell,
            access,
            ssh_pub_key: user.ssh_public_key.clone(),
        })
    }
}

impl GroupView {
    pub fn from_roster(roster: &GroupRoster) -> Result<Self, YokedError> {
        let users = roster
            .members
            .iter()
            .map(UserView::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: roster.group.id,
            name: roster.group.name.clone(),
            users,
        })
    }
}

impl From<&group::Model> for GroupRef {
    fn from(group: &group::Model) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
        }
    }
}

impl From<role::Model> for RoleView {
    fn from(role: role::Model) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
        }
    }
}

impl InstanceView {
    pub fn new(instance: &instance::Model, groups: &[group::Model]) -> Self {
        Self {
            id: instance.id,
            name: instance.name.clone(),
            instance_id: instance.instance_id.clone(),
            net: instance.net.clone().unwrap_or(Value::Null),
            date_created: rfc3339_millis(instance.created_at),
            last_seen: rfc3339_millis(instance.last_seen),
            groups: groups.iter().map(GroupRef::from).collect(),
        }
    }
}

fn rfc3339_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
