//! SurrealDB implementation of [`PermissionCatalogRepository`].
//!
//! Catalog records are keyed by the permission key itself, so key
//! uniqueness is enforced by record identity rather than a separate index.

use chrono::{DateTime, Utc};
use hram_core::error::HramResult;
use hram_core::models::permission::{
    CreatePermissionDefinition, PermissionDefinition, UpdatePermissionDefinition,
};
use hram_core::repository::PermissionCatalogRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    label: String,
    description: String,
    category: String,
    is_custom: bool,
    is_active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PermissionRowWithId {
    record_id: String,
    label: String,
    description: String,
    category: String,
    is_custom: bool,
    is_active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_definition(self, key: String) -> PermissionDefinition {
        PermissionDefinition {
            key,
            label: self.label,
            description: self.description,
            category: self.category,
            is_custom: self.is_custom,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl PermissionRowWithId {
    fn into_definition(self) -> PermissionDefinition {
        PermissionDefinition {
            key: self.record_id,
            label: self.label,
            description: self.description,
            category: self.category,
            is_custom: self.is_custom,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// SurrealDB implementation of the permission catalog repository.
#[derive(Clone)]
pub struct SurrealPermissionCatalogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionCatalogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionCatalogRepository for SurrealPermissionCatalogRepository<C> {
    async fn create(&self, input: CreatePermissionDefinition) -> HramResult<PermissionDefinition> {
        let key = input.key.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('global_permission', $key) SET \
                 label = $label, description = $description, \
                 category = $category, is_custom = $is_custom, \
                 is_active = true, created_by = $created_by",
            )
            .bind(("key", key.clone()))
            .bind(("label", input.label))
            .bind(("description", input.description))
            .bind(("category", input.category))
            .bind(("is_custom", input.is_custom))
            .bind(("created_by", input.created_by))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "global_permission".into(),
            id: key.clone(),
        })?;

        Ok(row.into_definition(key))
    }

    async fn get_by_key(&self, key: &str) -> HramResult<PermissionDefinition> {
        let key = key.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('global_permission', $key)")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "global_permission".into(),
            id: key.clone(),
        })?;

        Ok(row.into_definition(key))
    }

    async fn update(
        &self,
        key: &str,
        input: UpdatePermissionDefinition,
    ) -> HramResult<PermissionDefinition> {
        let key = key.to_string();

        let mut sets = Vec::new();
        if input.label.is_some() {
            sets.push("label = $label");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('global_permission', $key) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("key", key.clone()));

        if let Some(label) = input.label {
            builder = builder.bind(("label", label));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "global_permission".into(),
            id: key.clone(),
        })?;

        Ok(row.into_definition(key))
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> HramResult<PermissionDefinition> {
        let current = self.get_by_key(old_key).await?;

        // Copy under the new key and drop the old record atomically.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('global_permission', $new_key) SET \
                 label = $label, description = $description, \
                 category = $category, is_custom = $is_custom, \
                 is_active = $is_active, created_by = $created_by, \
                 created_at = $created_at; \
                 DELETE type::record('global_permission', $old_key); \
                 COMMIT TRANSACTION;",
            )
            .bind(("new_key", new_key.to_string()))
            .bind(("old_key", old_key.to_string()))
            .bind(("label", current.label.clone()))
            .bind(("description", current.description.clone()))
            .bind(("category", current.category.clone()))
            .bind(("is_custom", current.is_custom))
            .bind(("is_active", current.is_active))
            .bind(("created_by", current.created_by.clone()))
            .bind(("created_at", current.created_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_key(new_key).await
    }

    async fn delete_cascade(&self, key: &str) -> HramResult<()> {
        // Assignment rows referencing the key and the definition itself go
        // together: a crash cannot leave orphaned references behind.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE role_permission WHERE permission_key = $key; \
                 DELETE type::record('global_permission', $key); \
                 COMMIT TRANSACTION;",
            )
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_active(&self) -> HramResult<Vec<PermissionDefinition>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM global_permission \
                 WHERE is_active = true \
                 ORDER BY category ASC, label ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows.into_iter().map(|row| row.into_definition()).collect())
    }
}
