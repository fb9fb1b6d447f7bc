//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity. Roles and
//! audit actions are stored as strings with ASSERT constraints. The
//! `global_permission` table is keyed by the permission key itself;
//! `role_permission` is keyed by `role:key` so upserts cannot duplicate a
//! pair.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Permission catalog (organization-wide, keyed by permission key)
-- =======================================================================
DEFINE TABLE global_permission SCHEMAFULL;
DEFINE FIELD label ON TABLE global_permission TYPE string;
DEFINE FIELD description ON TABLE global_permission TYPE string;
DEFINE FIELD category ON TABLE global_permission TYPE string;
DEFINE FIELD is_custom ON TABLE global_permission TYPE bool \
    DEFAULT false;
DEFINE FIELD is_active ON TABLE global_permission TYPE bool \
    DEFAULT true;
DEFINE FIELD created_by ON TABLE global_permission TYPE string;
DEFINE FIELD created_at ON TABLE global_permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE global_permission TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Role-permission assignments (keyed by `role:key`)
-- =======================================================================
DEFINE TABLE role_permission SCHEMAFULL;
DEFINE FIELD role ON TABLE role_permission TYPE string \
    ASSERT $value IN ['staff', 'team_leader', 'manager', 'superadmin'];
DEFINE FIELD permission_key ON TABLE role_permission TYPE string;
DEFINE FIELD enabled ON TABLE role_permission TYPE bool DEFAULT false;
DEFINE FIELD updated_by ON TABLE role_permission TYPE string;
DEFINE FIELD updated_at ON TABLE role_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_permission_pair ON TABLE role_permission \
    COLUMNS role, permission_key UNIQUE;
DEFINE INDEX idx_role_permission_key ON TABLE role_permission \
    COLUMNS permission_key;

-- =======================================================================
-- Audit log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['Create', 'Update', 'Delete', 'Enable', 'Disable'];
DEFINE FIELD permission_key ON TABLE audit_log TYPE string;
DEFINE FIELD role ON TABLE audit_log TYPE option<string>;
DEFINE FIELD old_value ON TABLE audit_log FLEXIBLE TYPE option<object>;
DEFINE FIELD new_value ON TABLE audit_log FLEXIBLE TYPE option<object>;
DEFINE FIELD changed_by ON TABLE audit_log TYPE string;
DEFINE FIELD changed_at ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_changed_at ON TABLE audit_log \
    COLUMNS changed_at;
DEFINE INDEX idx_audit_permission_key ON TABLE audit_log \
    COLUMNS permission_key;

-- =======================================================================
-- Permission templates
-- =======================================================================
DEFINE TABLE permission_template SCHEMAFULL;
DEFINE FIELD name ON TABLE permission_template TYPE string;
DEFINE FIELD description ON TABLE permission_template TYPE string;
DEFINE FIELD category ON TABLE permission_template TYPE string;
DEFINE FIELD permissions ON TABLE permission_template TYPE array;
DEFINE FIELD permissions.* ON TABLE permission_template TYPE string;
DEFINE FIELD is_system ON TABLE permission_template TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE permission_template TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission_template TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_template_name ON TABLE permission_template \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Employees
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD display_name ON TABLE employee TYPE string;
DEFINE FIELD email ON TABLE employee TYPE string;
DEFINE FIELD role ON TABLE employee TYPE string \
    ASSERT $value IN ['staff', 'team_leader', 'manager', 'superadmin'];
DEFINE FIELD active ON TABLE employee TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_employee_email ON TABLE employee \
    COLUMNS email UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies each
/// migration whose version exceeds the current maximum. All DEFINE
/// statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Query(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Query(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Query(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that bypass the
/// migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
