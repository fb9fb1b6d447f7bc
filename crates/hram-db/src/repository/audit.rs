//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The audit table is append-only: the schema forbids update and delete,
//! and this repository exposes no mutation beyond `append`.

use chrono::{DateTime, Utc};
use hram_core::error::HramResult;
use hram_core::models::audit::{AuditAction, AuditRecord, CreateAuditRecord};
use hram_core::models::role::Role;
use hram_core::repository::{AuditFilter, AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    action: String,
    permission_key: String,
    role: Option<String>,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
    changed_by: String,
    changed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    action: String,
    permission_key: String,
    role: Option<String>,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
    changed_by: String,
    changed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_action(s: &str) -> Result<AuditAction, DbError> {
    AuditAction::parse(s).ok_or_else(|| DbError::Decode(format!("unknown audit action: {s}")))
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Decode(format!("unknown role: {s}")))
}

impl AuditRow {
    fn try_into_record(self, id: Uuid) -> Result<AuditRecord, DbError> {
        let role = self.role.as_deref().map(parse_role).transpose()?;
        Ok(AuditRecord {
            id,
            action: parse_action(&self.action)?,
            permission_key: self.permission_key,
            role,
            old_value: self.old_value,
            new_value: self.new_value,
            changed_by: self.changed_by,
            changed_at: self.changed_at,
        })
    }
}

impl AuditRowWithId {
    fn try_into_record(self) -> Result<AuditRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let role = self.role.as_deref().map(parse_role).transpose()?;
        Ok(AuditRecord {
            id,
            action: parse_action(&self.action)?,
            permission_key: self.permission_key,
            role,
            old_value: self.old_value,
            new_value: self.new_value,
            changed_by: self.changed_by,
            changed_at: self.changed_at,
        })
    }
}

/// Build the conjunctive WHERE clause for a filter. Returns an empty string
/// when no filter fields are set.
fn where_clause(filter: &AuditFilter) -> String {
    let mut conditions = Vec::new();
    if filter.action.is_some() {
        conditions.push("action = $action");
    }
    if filter.actor_contains.is_some() {
        conditions.push("changed_by CONTAINS $actor");
    }
    if filter.role.is_some() {
        conditions.push("role = $role");
    }
    if filter.from.is_some() {
        conditions.push("changed_at >= $from");
    }
    if filter.to.is_some() {
        conditions.push("changed_at <= $to");
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

/// SurrealDB implementation of the audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditRecord) -> HramResult<AuditRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 action = $action, permission_key = $key, role = $role, \
                 old_value = $old_value, new_value = $new_value, \
                 changed_by = $changed_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("action", input.action.as_str()))
            .bind(("key", input.permission_key))
            .bind(("role", input.role.map(|r| r.as_str().to_string())))
            .bind(("old_value", input.old_value))
            .bind(("new_value", input.new_value))
            .bind(("changed_by", input.changed_by))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.try_into_record(id)?)
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> HramResult<PaginatedResult<AuditRecord>> {
        let clause = where_clause(&filter);

        let count_query = format!("SELECT count() AS total FROM audit_log{clause} GROUP ALL");
        let mut builder = self.db.query(&count_query);
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action.as_str()));
        }
        if let Some(actor) = &filter.actor_contains {
            builder = builder.bind(("actor", actor.clone()));
        }
        if let Some(role) = filter.role {
            builder = builder.bind(("role", role.as_str()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        let mut count_result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log{clause} \
             ORDER BY changed_at DESC LIMIT $limit START $offset"
        );
        let mut builder = self
            .db
            .query(&page_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action.as_str()));
        }
        if let Some(actor) = filter.actor_contains {
            builder = builder.bind(("actor", actor));
        }
        if let Some(role) = filter.role {
            builder = builder.bind(("role", role.as_str()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_record())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
