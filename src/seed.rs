use crate::errors::YokedError;
use crate::settings::Seed;
use crate::storage;
use sea_orm::{DatabaseConnection, TransactionTrait};
use sea_orm_migration::MigratorTrait;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub unchanged: usize,
}

/// Insert the configured shells, access levels and roles that are not present
/// yet, matching by name. Existing rows are left as they are.
pub async fn seed_reference_data(
    db: &DatabaseConnection,
    seed: &Seed,
) -> Result<SeedReport, YokedError> {
    let mut report = SeedReport::default();
    let txn = db.begin().await?;

    for shell in &seed.shells {
        if storage::find_shell_by_name(&txn, &shell.name).await?.is_some() {
            report.unchanged += 1;
        } else {
            tracing::info!("Creating shell: {} ({})", shell.name, shell.path);
            storage::create_shell(&txn, &shell.name, &shell.path).await?;
            report.created += 1;
        }
    }

    for access in &seed.access {
        if storage::find_access_by_name(&txn, &access.name).await?.is_some() {
            report.unchanged += 1;
        } else {
            tracing::info!("Creating access level: {}", access.name);
            storage::create_access(&txn, &access.name, &access.description).await?;
            report.created += 1;
        }
    }

    for role in &seed.roles {
        if storage::find_role_by_name(&txn, &role.name).await?.is_some() {
            report.unchanged += 1;
        } else {
            tracing::info!("Creating role: {}", role.name);
            storage::create_role(&txn, &role.name, &role.description).await?;
            report.created += 1;
        }
    }

    txn.commit().await?;
    tracing::info!(
        "Seed complete: {} created, {} unchanged",
        report.created,
        report.unchanged
    );
    Ok(report)
}

/// Drop every table, re-apply all migrations and seed reference data.
pub async fn reset_database(
    db: &DatabaseConnection,
    seed: &Seed,
) -> Result<SeedReport, YokedError> {
    tracing::warn!("Resetting database: all instances, groups and users will be removed");
    migration::Migrator::fresh(db).await?;
    seed_reference_data(db, seed).await
}
