//! SurrealDB implementation of [`RolePermissionRepository`].
//!
//! Assignment records are keyed by `role:key`, so the at-most-one-row-per-
//! pair invariant holds by construction and UPSERT never duplicates.

use chrono::{DateTime, Utc};
use hram_core::error::HramResult;
use hram_core::models::assignment::RoleAssignment;
use hram_core::models::role::Role;
use hram_core::repository::RolePermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AssignmentRow {
    role: String,
    permission_key: String,
    enabled: bool,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

impl AssignmentRow {
    fn try_into_assignment(self) -> Result<RoleAssignment, DbError> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| DbError::Decode(format!("unknown role: {}", self.role)))?;
        Ok(RoleAssignment {
            role,
            permission_key: self.permission_key,
            enabled: self.enabled,
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        })
    }
}

fn record_id(role: Role, key: &str) -> String {
    format!("{}:{}", role.as_str(), key)
}

/// SurrealDB implementation of the role-permission map repository.
#[derive(Clone)]
pub struct SurrealRolePermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRolePermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RolePermissionRepository for SurrealRolePermissionRepository<C> {
    async fn upsert(
        &self,
        role: Role,
        key: &str,
        enabled: bool,
        updated_by: &str,
    ) -> HramResult<RoleAssignment> {
        let id = record_id(role, key);

        let result = self
            .db
            .query(
                "UPSERT type::record('role_permission', $id) SET \
                 role = $role, permission_key = $key, enabled = $enabled, \
                 updated_by = $updated_by, updated_at = time::now()",
            )
            .bind(("id", id.clone()))
            .bind(("role", role.as_str()))
            .bind(("key", key.to_string()))
            .bind(("enabled", enabled))
            .bind(("updated_by", updated_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AssignmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role_permission".into(),
            id,
        })?;

        Ok(row.try_into_assignment()?)
    }

    async fn get(&self, role: Role, key: &str) -> HramResult<Option<RoleAssignment>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role_permission', $id)")
            .bind(("id", record_id(role, key)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRow> = result.take(0).map_err(DbError::from)?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_assignment()?)),
            None => Ok(None),
        }
    }

    async fn list(&self, role: Role) -> HramResult<Vec<RoleAssignment>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM role_permission WHERE role = $role \
                 ORDER BY permission_key ASC",
            )
            .bind(("role", role.as_str()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRow> = result.take(0).map_err(DbError::from)?;

        let assignments = rows
            .into_iter()
            .map(|row| row.try_into_assignment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(assignments)
    }

    async fn list_enabled_keys(&self, role: Role) -> HramResult<Vec<String>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE permission_key FROM role_permission \
                 WHERE role = $role AND enabled = true",
            )
            .bind(("role", role.as_str()))
            .await
            .map_err(DbError::from)?;

        let keys: Vec<String> = result.take(0).map_err(DbError::from)?;

        Ok(keys)
    }

    async fn count_for_key(&self, key: &str) -> HramResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM role_permission \
                 WHERE permission_key = $key GROUP ALL",
            )
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
