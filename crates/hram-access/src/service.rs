//! Access service — catalog, role-permission, template, and bulk employee
//! orchestration.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use hram_core::error::{HramError, HramResult};
use hram_core::models::assignment::RoleAssignment;
use hram_core::models::audit::{AuditAction, AuditRecord, CreateAuditRecord};
use hram_core::models::employee::{CreateEmployee, Employee, UpdateEmployee};
use hram_core::models::permission::{
    CreatePermissionDefinition, PermissionDefinition, UpdatePermissionDefinition,
};
use hram_core::models::role::Role;
use hram_core::models::template::{
    CreateTemplate, PermissionTemplate, TEMPLATE_DOCUMENT_VERSION, TemplateDocument,
    UpdateTemplate,
};
use hram_core::repository::{
    AuditFilter, AuditLogRepository, EmployeeRepository, PaginatedResult, Pagination,
    PermissionCatalogRepository, RolePermissionRepository, TemplateRepository,
};
use tracing::warn;
use uuid::Uuid;

use crate::config::AccessConfig;

/// Partial update for a permission definition, including an optional key
/// rename. Key immutability rules are enforced here, not in storage.
#[derive(Debug, Clone, Default)]
pub struct DefinitionPatch {
    pub key: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Outcome of one item in a bulk employee operation.
///
/// Bulk operations are not atomic: a failed item leaves the others
/// untouched, and the caller receives one of these per input id.
#[derive(Debug, Clone)]
pub struct BulkItemResult {
    pub id: Uuid,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome of one permission key during a template application.
#[derive(Debug, Clone)]
pub struct TemplateApplyResult {
    pub key: String,
    pub success: bool,
    pub error: Option<String>,
}

/// The single write path for all catalog, role-permission, template, and
/// employee mutations.
///
/// Generic over repository implementations so the service layer has no
/// dependency on the database crate.
pub struct AccessService<C, R, A, T, E> {
    catalog: C,
    assignments: R,
    audit: A,
    templates: T,
    employees: E,
    config: AccessConfig,
}

impl<C, R, A, T, E> AccessService<C, R, A, T, E>
where
    C: PermissionCatalogRepository,
    R: RolePermissionRepository,
    A: AuditLogRepository,
    T: TemplateRepository,
    E: EmployeeRepository,
{
    pub fn new(
        catalog: C,
        assignments: R,
        audit: A,
        templates: T,
        employees: E,
        config: AccessConfig,
    ) -> Self {
        Self {
            catalog,
            assignments,
            audit,
            templates,
            employees,
            config,
        }
    }

    /// Append an audit record for a completed mutation.
    ///
    /// Advisory by default: the primary mutation has already committed, so
    /// a failed append is logged rather than unwinding it. With
    /// `strict_audit` the failure propagates instead.
    async fn record_audit(&self, entry: CreateAuditRecord) -> HramResult<()> {
        match self.audit.append(entry).await {
            Ok(_) => Ok(()),
            Err(e) if self.config.strict_audit => Err(e),
            Err(e) => {
                warn!(error = %e, "audit append failed, continuing");
                Ok(())
            }
        }
    }

    fn snapshot(def: &PermissionDefinition) -> HramResult<serde_json::Value> {
        serde_json::to_value(def).map_err(|e| HramError::Internal(e.to_string()))
    }

    // -------------------------------------------------------------------
    // Permission catalog
    // -------------------------------------------------------------------

    /// All active definitions grouped by category.
    pub async fn list_definitions(
        &self,
    ) -> HramResult<BTreeMap<String, Vec<PermissionDefinition>>> {
        let definitions = self.catalog.list_active().await?;

        let mut grouped: BTreeMap<String, Vec<PermissionDefinition>> = BTreeMap::new();
        for def in definitions {
            grouped.entry(def.category.clone()).or_default().push(def);
        }

        Ok(grouped)
    }

    pub async fn get_definition(&self, key: &str) -> HramResult<PermissionDefinition> {
        self.catalog.get_by_key(key).await
    }

    /// Add a definition to the catalog.
    pub async fn add_definition(
        &self,
        input: CreatePermissionDefinition,
    ) -> HramResult<PermissionDefinition> {
        if input.key.trim().is_empty() {
            return Err(HramError::validation("permission key must not be empty"));
        }
        if input.label.trim().is_empty() {
            return Err(HramError::validation("permission label must not be empty"));
        }

        match self.catalog.get_by_key(&input.key).await {
            Ok(_) => {
                return Err(HramError::validation(format!(
                    "permission key already exists: {}",
                    input.key
                )));
            }
            Err(HramError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let created = self.catalog.create(input).await?;

        self.record_audit(CreateAuditRecord {
            action: AuditAction::Create,
            permission_key: created.key.clone(),
            role: None,
            old_value: None,
            new_value: Some(Self::snapshot(&created)?),
            changed_by: created.created_by.clone(),
        })
        .await?;

        Ok(created)
    }

    /// Update a definition in place.
    ///
    /// System definitions may only change label, description, and
    /// category. A custom definition's key may change only while no role
    /// references it.
    pub async fn update_definition(
        &self,
        key: &str,
        patch: DefinitionPatch,
        actor: &str,
    ) -> HramResult<PermissionDefinition> {
        let current = self.catalog.get_by_key(key).await?;

        if let Some(label) = &patch.label
            && label.trim().is_empty()
        {
            return Err(HramError::validation("permission label must not be empty"));
        }

        if !current.is_custom {
            if patch.key.as_deref().is_some_and(|k| k != current.key) {
                return Err(HramError::validation(
                    "system permission keys are immutable",
                ));
            }
            if patch.is_active.is_some() {
                return Err(HramError::validation(
                    "system definitions cannot be deactivated",
                ));
            }
        }

        let mut effective_key = current.key.clone();
        if let Some(new_key) = &patch.key
            && *new_key != current.key
        {
            if new_key.trim().is_empty() {
                return Err(HramError::validation("permission key must not be empty"));
            }
            if self.assignments.count_for_key(&current.key).await? > 0 {
                return Err(HramError::validation(
                    "cannot rename a permission referenced by role assignments",
                ));
            }
            match self.catalog.get_by_key(new_key).await {
                Ok(_) => {
                    return Err(HramError::validation(format!(
                        "permission key already exists: {new_key}"
                    )));
                }
                Err(HramError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
            self.catalog.rename(&current.key, new_key).await?;
            effective_key = new_key.clone();
        }

        let updated = self
            .catalog
            .update(
                &effective_key,
                UpdatePermissionDefinition {
                    label: patch.label,
                    description: patch.description,
                    category: patch.category,
                    is_active: patch.is_active,
                },
            )
            .await?;

        self.record_audit(CreateAuditRecord {
            action: AuditAction::Update,
            permission_key: updated.key.clone(),
            role: None,
            old_value: Some(Self::snapshot(&current)?),
            new_value: Some(Self::snapshot(&updated)?),
            changed_by: actor.to_string(),
        })
        .await?;

        Ok(updated)
    }

    /// Delete a custom definition, cascading removal of every role
    /// assignment that references it. System definitions are undeletable.
    pub async fn delete_definition(&self, key: &str, actor: &str) -> HramResult<()> {
        let current = self.catalog.get_by_key(key).await?;

        if !current.is_custom {
            return Err(HramError::validation(
                "system definitions cannot be deleted",
            ));
        }

        self.catalog.delete_cascade(key).await?;

        self.record_audit(CreateAuditRecord {
            action: AuditAction::Delete,
            permission_key: current.key.clone(),
            role: None,
            old_value: Some(Self::snapshot(&current)?),
            new_value: None,
            changed_by: actor.to_string(),
        })
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------
    // Role-permission map & evaluator
    // -------------------------------------------------------------------

    /// Whether `role` holds an enabled grant for `key`.
    ///
    /// Absence is the default-deny state: an unknown key, a disabled
    /// assignment, or an assignment whose definition has been removed or
    /// deactivated all evaluate to `false`. Only storage failures error.
    pub async fn has_permission(&self, role: Role, key: &str) -> HramResult<bool> {
        self.evaluate_grant(role, key).await
    }

    pub(crate) async fn evaluate_grant(&self, role: Role, key: &str) -> HramResult<bool> {
        let assignment = self.assignments.get(role, key).await?;
        let Some(assignment) = assignment else {
            return Ok(false);
        };
        if !assignment.enabled {
            return Ok(false);
        }

        // An orphaned assignment left by a crashed cascade reads as deny.
        match self.catalog.get_by_key(key).await {
            Ok(def) => Ok(def.is_active),
            Err(HramError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Enable or disable a permission for a role. Upserts, so re-applying
    /// the current state succeeds and still produces an audit record.
    pub async fn set_permission(
        &self,
        role: Role,
        key: &str,
        enabled: bool,
        actor: &str,
    ) -> HramResult<()> {
        match self.catalog.get_by_key(key).await {
            Ok(def) if def.is_active => {}
            Ok(_) | Err(HramError::NotFound { .. }) => {
                return Err(HramError::not_found("global_permission", key));
            }
            Err(e) => return Err(e),
        }

        let previous = self.assignments.get(role, key).await?;
        self.assignments.upsert(role, key, enabled, actor).await?;

        let action = if enabled {
            AuditAction::Enable
        } else {
            AuditAction::Disable
        };

        self.record_audit(CreateAuditRecord {
            action,
            permission_key: key.to_string(),
            role: Some(role),
            old_value: previous.map(|p| serde_json::json!({ "enabled": p.enabled })),
            new_value: Some(serde_json::json!({ "enabled": enabled })),
            changed_by: actor.to_string(),
        })
        .await?;

        Ok(())
    }

    /// Enabled permission keys for a role whose definitions are still
    /// active.
    pub async fn list_role_permissions(&self, role: Role) -> HramResult<BTreeSet<String>> {
        let enabled = self.assignments.list_enabled_keys(role).await?;
        let active: BTreeSet<String> = self
            .catalog
            .list_active()
            .await?
            .into_iter()
            .map(|def| def.key)
            .collect();

        Ok(enabled
            .into_iter()
            .filter(|key| active.contains(key))
            .collect())
    }

    /// Raw assignment rows for a role, enabled or not.
    pub async fn list_role_assignments(&self, role: Role) -> HramResult<Vec<RoleAssignment>> {
        self.assignments.list(role).await
    }

    // -------------------------------------------------------------------
    // Templates
    // -------------------------------------------------------------------

    fn dedup_permissions(permissions: Vec<String>) -> Vec<String> {
        permissions
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    async fn ensure_template_name_free(&self, name: &str) -> HramResult<()> {
        match self.templates.get_by_name(name).await {
            Ok(_) => Err(HramError::validation(format!(
                "template name already exists: {name}"
            ))),
            Err(HramError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn create_template(&self, input: CreateTemplate) -> HramResult<PermissionTemplate> {
        if input.name.trim().is_empty() {
            return Err(HramError::validation("template name must not be empty"));
        }
        self.ensure_template_name_free(&input.name).await?;

        let CreateTemplate {
            name,
            description,
            category,
            permissions,
            is_system,
        } = input;

        self.templates
            .create(CreateTemplate {
                name,
                description,
                category,
                permissions: Self::dedup_permissions(permissions),
                is_system,
            })
            .await
    }

    pub async fn get_template(&self, id: Uuid) -> HramResult<PermissionTemplate> {
        self.templates.get_by_id(id).await
    }

    pub async fn get_template_by_name(&self, name: &str) -> HramResult<PermissionTemplate> {
        self.templates.get_by_name(name).await
    }

    pub async fn list_templates(
        &self,
        pagination: Pagination,
    ) -> HramResult<PaginatedResult<PermissionTemplate>> {
        self.templates.list(pagination).await
    }

    pub async fn update_template(
        &self,
        id: Uuid,
        patch: UpdateTemplate,
    ) -> HramResult<PermissionTemplate> {
        let current = self.templates.get_by_id(id).await?;

        if let Some(name) = &patch.name
            && *name != current.name
        {
            if current.is_system {
                return Err(HramError::validation("system templates cannot be renamed"));
            }
            if name.trim().is_empty() {
                return Err(HramError::validation("template name must not be empty"));
            }
            self.ensure_template_name_free(name).await?;
        }

        let UpdateTemplate {
            name,
            description,
            category,
            permissions,
        } = patch;

        self.templates
            .update(
                id,
                UpdateTemplate {
                    name,
                    description,
                    category,
                    permissions: permissions.map(Self::dedup_permissions),
                },
            )
            .await
    }

    pub async fn delete_template(&self, id: Uuid) -> HramResult<()> {
        let current = self.templates.get_by_id(id).await?;

        if current.is_system {
            return Err(HramError::validation("system templates cannot be deleted"));
        }

        self.templates.delete(id).await
    }

    pub async fn duplicate_template(
        &self,
        id: Uuid,
        new_name: &str,
    ) -> HramResult<PermissionTemplate> {
        let source = self.templates.get_by_id(id).await?;

        self.create_template(CreateTemplate {
            name: new_name.to_string(),
            description: source.description,
            category: source.category,
            permissions: source.permissions,
            is_system: false,
        })
        .await
    }

    /// Serialize a template to its portable document form.
    pub async fn export_template(&self, id: Uuid) -> HramResult<TemplateDocument> {
        let template = self.templates.get_by_id(id).await?;

        Ok(TemplateDocument {
            name: template.name,
            description: template.description,
            category: template.category,
            permissions: template.permissions,
            exported_at: Utc::now(),
            version: TEMPLATE_DOCUMENT_VERSION,
        })
    }

    /// Parse and store a portable template document. Malformed documents
    /// and name collisions are rejected; imported templates are never
    /// system templates.
    pub async fn import_template(&self, doc: TemplateDocument) -> HramResult<PermissionTemplate> {
        if doc.version != TEMPLATE_DOCUMENT_VERSION {
            return Err(HramError::validation(format!(
                "unsupported template document version: {}",
                doc.version
            )));
        }
        if doc.name.trim().is_empty() {
            return Err(HramError::validation("template name must not be empty"));
        }
        if doc.permissions.iter().any(|key| key.trim().is_empty()) {
            return Err(HramError::validation(
                "template document contains an empty permission key",
            ));
        }

        self.create_template(CreateTemplate {
            name: doc.name,
            description: doc.description,
            category: doc.category,
            permissions: doc.permissions,
            is_system: false,
        })
        .await
    }

    /// Union a template's keys into a role's enabled set.
    ///
    /// Permissions already enabled on the role but absent from the
    /// template stay enabled. Keys whose definitions no longer exist are
    /// reported as per-item failures rather than aborting the apply.
    pub async fn apply_template(
        &self,
        template_id: Uuid,
        role: Role,
        actor: &str,
    ) -> HramResult<Vec<TemplateApplyResult>> {
        let template = self.templates.get_by_id(template_id).await?;

        let mut results = Vec::with_capacity(template.permissions.len());
        for key in &template.permissions {
            match self.set_permission(role, key, true, actor).await {
                Ok(()) => results.push(TemplateApplyResult {
                    key: key.clone(),
                    success: true,
                    error: None,
                }),
                Err(e) => results.push(TemplateApplyResult {
                    key: key.clone(),
                    success: false,
                    error: Some(e.to_string()),
                }),
            }
        }

        Ok(results)
    }

    // -------------------------------------------------------------------
    // Audit trail
    // -------------------------------------------------------------------

    /// Query the audit trail. All provided filter fields are ANDed; an
    /// empty filter returns everything, newest first.
    pub async fn audit_trail(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> HramResult<PaginatedResult<AuditRecord>> {
        self.audit.list(filter, pagination).await
    }

    // -------------------------------------------------------------------
    // Employees & bulk operations
    // -------------------------------------------------------------------

    pub async fn create_employee(&self, input: CreateEmployee) -> HramResult<Employee> {
        if input.email.trim().is_empty() {
            return Err(HramError::validation("employee email must not be empty"));
        }

        match self.employees.get_by_email(&input.email).await {
            Ok(_) => {
                return Err(HramError::validation(format!(
                    "employee email already exists: {}",
                    input.email
                )));
            }
            Err(HramError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        self.employees.create(input).await
    }

    pub async fn get_employee(&self, id: Uuid) -> HramResult<Employee> {
        self.employees.get_by_id(id).await
    }

    pub async fn list_employees(
        &self,
        pagination: Pagination,
    ) -> HramResult<PaginatedResult<Employee>> {
        self.employees.list(pagination).await
    }

    async fn bulk_update(&self, ids: &[Uuid], patch: UpdateEmployee) -> Vec<BulkItemResult> {
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.employees.update(id, patch.clone()).await {
                Ok(_) => results.push(BulkItemResult {
                    id,
                    success: true,
                    error: None,
                }),
                Err(e) => results.push(BulkItemResult {
                    id,
                    success: false,
                    error: Some(e.to_string()),
                }),
            }
        }
        results
    }

    /// Move each listed employee to `target_role`. Per-item failures do
    /// not abort the batch.
    pub async fn bulk_set_role(&self, ids: &[Uuid], target_role: Role) -> Vec<BulkItemResult> {
        self.bulk_update(
            ids,
            UpdateEmployee {
                role: Some(target_role),
                ..Default::default()
            },
        )
        .await
    }

    /// Activate or deactivate each listed employee.
    pub async fn bulk_set_status(&self, ids: &[Uuid], active: bool) -> Vec<BulkItemResult> {
        self.bulk_update(
            ids,
            UpdateEmployee {
                active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Return each listed employee to the configured baseline role, so
    /// their effective permissions come purely from the baseline grants.
    pub async fn bulk_reset_permissions(&self, ids: &[Uuid]) -> Vec<BulkItemResult> {
        self.bulk_update(
            ids,
            UpdateEmployee {
                role: Some(self.config.default_role),
                ..Default::default()
            },
        )
        .await
    }
}
