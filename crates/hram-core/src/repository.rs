//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The service layer depends only on
//! these traits, never on a concrete store. Implementations serialize
//! writes only as far as the backing store does: concurrent upserts of the
//! same `(role, permission_key)` pair are last-write-wins.

use uuid::Uuid;

use crate::error::HramResult;
use crate::models::{
    assignment::RoleAssignment,
    audit::{AuditAction, AuditRecord, CreateAuditRecord},
    employee::{CreateEmployee, Employee, UpdateEmployee},
    permission::{CreatePermissionDefinition, PermissionDefinition, UpdatePermissionDefinition},
    role::Role,
    template::{CreateTemplate, PermissionTemplate, UpdateTemplate},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Permission catalog
// ---------------------------------------------------------------------------

pub trait PermissionCatalogRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePermissionDefinition,
    ) -> impl Future<Output = HramResult<PermissionDefinition>> + Send;

    fn get_by_key(&self, key: &str)
    -> impl Future<Output = HramResult<PermissionDefinition>> + Send;

    fn update(
        &self,
        key: &str,
        input: UpdatePermissionDefinition,
    ) -> impl Future<Output = HramResult<PermissionDefinition>> + Send;

    /// Change a definition's key. The caller is responsible for the
    /// immutability rules (system definitions, referenced custom ones).
    fn rename(
        &self,
        old_key: &str,
        new_key: &str,
    ) -> impl Future<Output = HramResult<PermissionDefinition>> + Send;

    /// Remove a definition and every role assignment referencing it, in a
    /// single store transaction.
    fn delete_cascade(&self, key: &str) -> impl Future<Output = HramResult<()>> + Send;

    /// All active definitions, ordered by category then label.
    fn list_active(&self) -> impl Future<Output = HramResult<Vec<PermissionDefinition>>> + Send;
}

// ---------------------------------------------------------------------------
// Role-permission map
// ---------------------------------------------------------------------------

pub trait RolePermissionRepository: Send + Sync {
    /// Insert or overwrite the assignment row for `(role, key)`.
    fn upsert(
        &self,
        role: Role,
        key: &str,
        enabled: bool,
        updated_by: &str,
    ) -> impl Future<Output = HramResult<RoleAssignment>> + Send;

    fn get(
        &self,
        role: Role,
        key: &str,
    ) -> impl Future<Output = HramResult<Option<RoleAssignment>>> + Send;

    /// All assignment rows for a role, enabled or not.
    fn list(&self, role: Role) -> impl Future<Output = HramResult<Vec<RoleAssignment>>> + Send;

    /// Enabled permission keys for a role.
    fn list_enabled_keys(&self, role: Role) -> impl Future<Output = HramResult<Vec<String>>> + Send;

    /// Number of assignment rows (any role) referencing a permission key.
    fn count_for_key(&self, key: &str) -> impl Future<Output = HramResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Audit trail (append-only)
// ---------------------------------------------------------------------------

/// Query filters for the audit trail. All provided fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    /// Substring match against `changed_by`.
    pub actor_contains: Option<String>,
    pub role: Option<Role>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit record. No update or delete operations exist;
    /// corrections are written as new compensating records.
    fn append(
        &self,
        input: CreateAuditRecord,
    ) -> impl Future<Output = HramResult<AuditRecord>> + Send;

    /// Matching records, newest first. An empty filter returns all.
    fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> impl Future<Output = HramResult<PaginatedResult<AuditRecord>>> + Send;
}

// ---------------------------------------------------------------------------
// Permission templates
// ---------------------------------------------------------------------------

pub trait TemplateRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTemplate,
    ) -> impl Future<Output = HramResult<PermissionTemplate>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = HramResult<PermissionTemplate>> + Send;

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = HramResult<PermissionTemplate>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateTemplate,
    ) -> impl Future<Output = HramResult<PermissionTemplate>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = HramResult<()>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = HramResult<PaginatedResult<PermissionTemplate>>> + Send;
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

pub trait EmployeeRepository: Send + Sync {
    fn create(&self, input: CreateEmployee) -> impl Future<Output = HramResult<Employee>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = HramResult<Employee>> + Send;

    fn get_by_email(&self, email: &str) -> impl Future<Output = HramResult<Employee>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateEmployee,
    ) -> impl Future<Output = HramResult<Employee>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = HramResult<PaginatedResult<Employee>>> + Send;
}
