//! Membership resolution: turns the group rosters an instance belongs to into
//! the set of accounts the host should provision.
//!
//! Groups are visited in ascending id order and users in ascending id order, so
//! the outcome never depends on the order rows came back from the database.
//! When two different user rows share a username the later one (by that order)
//! wins and the collision is logged. Usernames are unique for users created
//! through the admin operations, so collisions only come from rows written
//! behind the service's back.

use crate::errors::YokedError;
use crate::projection::UserProjection;
use crate::storage::GroupRoster;
use std::collections::BTreeMap;
use tracing::warn;

/// username -> account to provision
pub type ProvisioningSet = BTreeMap<String, UserProjection>;

pub fn resolve(rosters: &[GroupRoster]) -> Result<ProvisioningSet, YokedError> {
    let mut ordered: Vec<&GroupRoster> = rosters.iter().collect();
    ordered.sort_by_key(|r| r.group.id);

    let mut users = ProvisioningSet::new();
    let mut owners: BTreeMap<String, i32> = BTreeMap::new();

    for roster in ordered {
        let mut members: Vec<_> = roster.members.iter().collect();
        members.sort_by_key(|m| m.user.id);

        for member in members {
            let projection = UserProjection::from_record(member)?;
            let username = member.user.username.clone();

            if let Some(previous) = owners.insert(username.clone(), member.user.id) {
                if previous != member.user.id {
                    warn!(
                        username = %username,
                        replaced_user_id = previous,
                        user_id = member.user.id,
                        group_id = roster.group.id,
                        "username shared by distinct users; keeping the later one"
                    );
                }
            }
            users.insert(username, projection);
        }
    }

    Ok(users)
}
