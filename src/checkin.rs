//! Check-in processing: upsert the reporting instance, then resolve the
//! accounts it should provision.
//!
//! Instance names are matched after trimming surrounding whitespace.
//!
//! Two check-ins racing for a name that does not exist yet can both take the
//! insert path; the instance table has no unique constraint on `name`. Later
//! lookups pick the lowest id, so the host keeps a stable identity, but the
//! extra row is left in place.

use crate::errors::YokedError;
use crate::resolver::{self, ProvisioningSet};
use crate::storage;
use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde_json::Value;
use tracing::{debug, info};

/// A parsed check-in request.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub name: String,
    pub net: Value,
    /// The full request body, kept verbatim.
    pub raw_payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckInOutcome {
    pub instance_id: i32,
    pub created: bool,
    pub users: ProvisioningSet,
}

impl CheckIn {
    /// Parse `{"system": {"name": ..., "net": ...}, ...}`.
    pub fn from_payload(payload: Value) -> Result<Self, YokedError> {
        let system = payload
            .get("system")
            .and_then(Value::as_object)
            .ok_or_else(|| YokedError::InvalidRequest("`system` object is required".into()))?;

        let name = match system.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(YokedError::InvalidRequest(
                    "`system.name` must be a string".into(),
                ))
            }
            None => return Err(YokedError::InvalidRequest("`system.name` is required".into())),
        };
        let net = system.get("net").cloned().unwrap_or(Value::Null);

        Ok(Self {
            name,
            net,
            raw_payload: payload,
        })
    }
}

pub async fn check_in(db: &DatabaseConnection, req: CheckIn) -> Result<CheckInOutcome, YokedError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(YokedError::InvalidRequest(
            "instance name must not be empty".into(),
        ));
    }
    let now = Utc::now().timestamp_millis();

    // Rolled back on drop if anything below fails
    let txn = db.begin().await?;
    let (instance, created) = match storage::find_instance_by_name(&txn, name).await? {
        None => {
            let inst =
                storage::insert_instance(&txn, name, req.net, req.raw_payload, now).await?;
            (inst, true)
        }
        Some(existing) => {
            // last_seen never moves backwards, even within one clock tick
            let last_seen = now.max(existing.last_seen + 1);
            let inst =
                storage::overwrite_instance(&txn, existing, req.net, req.raw_payload, last_seen)
                    .await?;
            (inst, false)
        }
    };
    txn.commit().await?;

    if created {
        info!(instance_id = instance.id, name = %instance.name, "registered new instance");
    }

    let group_ids = storage::instance_group_ids(db, instance.id).await?;
    let rosters = storage::load_rosters(db, &group_ids).await?;
    let users = resolver::resolve(&rosters)?;

    debug!(
        instance_id = instance.id,
        groups = group_ids.len(),
        users = users.len(),
        "check-in resolved"
    );

    Ok(CheckInOutcome {
        instance_id: instance.id,
        created,
        users,
    })
}
