//! Integration tests for the access service against in-memory SurrealDB.

use hram_access::seed::seed_catalog;
use hram_access::{AccessConfig, AccessService, DefinitionPatch, PermissionEvaluator, WildcardGrant};
use hram_core::error::HramError;
use hram_core::models::audit::AuditAction;
use hram_core::models::employee::CreateEmployee;
use hram_core::models::permission::CreatePermissionDefinition;
use hram_core::models::role::Role;
use hram_core::models::template::{CreateTemplate, UpdateTemplate};
use hram_core::repository::{AuditFilter, Pagination};
use hram_db::repository::{
    SurrealAuditLogRepository, SurrealEmployeeRepository, SurrealPermissionCatalogRepository,
    SurrealRolePermissionRepository, SurrealTemplateRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type Svc = AccessService<
    SurrealPermissionCatalogRepository<Db>,
    SurrealRolePermissionRepository<Db>,
    SurrealAuditLogRepository<Db>,
    SurrealTemplateRepository<Db>,
    SurrealEmployeeRepository<Db>,
>;

const ADMIN: &str = "admin@example.com";

/// Spin up in-memory DB, run migrations, and build a service over it.
async fn setup() -> Svc {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hram_db::run_migrations(&db).await.unwrap();

    AccessService::new(
        SurrealPermissionCatalogRepository::new(db.clone()),
        SurrealRolePermissionRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        SurrealTemplateRepository::new(db.clone()),
        SurrealEmployeeRepository::new(db),
        AccessConfig::default(),
    )
}

fn definition(key: &str, category: &str, is_custom: bool) -> CreatePermissionDefinition {
    CreatePermissionDefinition {
        key: key.into(),
        label: key.replace('_', " "),
        description: format!("Grants {key}"),
        category: category.into(),
        is_custom,
        created_by: ADMIN.into(),
    }
}

// ---------------------------------------------------------------------------
// Role-permission map & evaluator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_round_trip() {
    let svc = setup().await;
    svc.add_definition(definition("approve_leave", "Leave Management", false))
        .await
        .unwrap();

    assert!(!svc.has_permission(Role::Staff, "approve_leave").await.unwrap());

    svc.set_permission(Role::Staff, "approve_leave", true, ADMIN)
        .await
        .unwrap();
    assert!(svc.has_permission(Role::Staff, "approve_leave").await.unwrap());

    svc.set_permission(Role::Staff, "approve_leave", false, ADMIN)
        .await
        .unwrap();
    assert!(!svc.has_permission(Role::Staff, "approve_leave").await.unwrap());
}

#[tokio::test]
async fn unknown_key_is_deny_not_error() {
    let svc = setup().await;

    assert!(!svc.has_permission(Role::Staff, "nonexistent").await.unwrap());
    assert!(
        !svc.has_permission(Role::Superadmin, "nonexistent")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn set_permission_unknown_key_fails() {
    let svc = setup().await;

    let err = svc
        .set_permission(Role::Staff, "nonexistent", true, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::NotFound { .. }));
}

#[tokio::test]
async fn set_permission_is_idempotent() {
    let svc = setup().await;
    svc.add_definition(definition("view_reports", "Reports", false))
        .await
        .unwrap();

    svc.set_permission(Role::Manager, "view_reports", true, ADMIN)
        .await
        .unwrap();
    // Re-applying the same state still succeeds.
    svc.set_permission(Role::Manager, "view_reports", true, ADMIN)
        .await
        .unwrap();

    assert!(svc.has_permission(Role::Manager, "view_reports").await.unwrap());
    let keys = svc.list_role_permissions(Role::Manager).await.unwrap();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn enable_appends_matching_audit_record() {
    let svc = setup().await;
    svc.add_definition(definition("approve_leave", "Leave Management", false))
        .await
        .unwrap();

    svc.set_permission(Role::Staff, "approve_leave", true, ADMIN)
        .await
        .unwrap();

    let page = svc
        .audit_trail(
            AuditFilter {
                action: Some(AuditAction::Enable),
                role: Some(Role::Staff),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].permission_key, "approve_leave");
    assert_eq!(page.items[0].changed_by, ADMIN);
}

#[tokio::test]
async fn deactivated_definition_evaluates_to_deny() {
    let svc = setup().await;
    svc.add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap();
    svc.set_permission(Role::Manager, "custom_x", true, ADMIN)
        .await
        .unwrap();

    svc.update_definition(
        "custom_x",
        DefinitionPatch {
            is_active: Some(false),
            ..Default::default()
        },
        ADMIN,
    )
    .await
    .unwrap();

    // The assignment row still exists, but the grant reads as deny.
    assert!(!svc.has_permission(Role::Manager, "custom_x").await.unwrap());
    assert!(svc.list_role_permissions(Role::Manager).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Permission catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_definition_rejects_bad_input() {
    let svc = setup().await;

    let err = svc
        .add_definition(definition("", "Custom", true))
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    let mut input = definition("custom_x", "Custom", true);
    input.label = String::new();
    let err = svc.add_definition(input).await.unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    svc.add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap();
    let err = svc
        .add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));
}

#[tokio::test]
async fn add_definition_emits_create_record() {
    let svc = setup().await;
    svc.add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap();

    let page = svc
        .audit_trail(
            AuditFilter {
                action: Some(AuditAction::Create),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].role, None, "catalog change carries no role");
}

#[tokio::test]
async fn system_definition_key_is_immutable() {
    let svc = setup().await;
    svc.add_definition(definition("approve_leave", "Leave Management", false))
        .await
        .unwrap();

    let err = svc
        .update_definition(
            "approve_leave",
            DefinitionPatch {
                key: Some("approve_leave_v2".into()),
                ..Default::default()
            },
            ADMIN,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    // Label/description/category edits remain allowed.
    let updated = svc
        .update_definition(
            "approve_leave",
            DefinitionPatch {
                label: Some("Approve Leave Requests".into()),
                ..Default::default()
            },
            ADMIN,
        )
        .await
        .unwrap();
    assert_eq!(updated.label, "Approve Leave Requests");
}

#[tokio::test]
async fn custom_key_rename_requires_no_references() {
    let svc = setup().await;
    svc.add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap();
    svc.set_permission(Role::Staff, "custom_x", true, ADMIN)
        .await
        .unwrap();

    let err = svc
        .update_definition(
            "custom_x",
            DefinitionPatch {
                key: Some("custom_y".into()),
                ..Default::default()
            },
            ADMIN,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    // Unreferenced definitions can be renamed.
    svc.add_definition(definition("custom_free", "Custom", true))
        .await
        .unwrap();
    let renamed = svc
        .update_definition(
            "custom_free",
            DefinitionPatch {
                key: Some("custom_renamed".into()),
                ..Default::default()
            },
            ADMIN,
        )
        .await
        .unwrap();
    assert_eq!(renamed.key, "custom_renamed");
    assert!(matches!(
        svc.get_definition("custom_free").await.unwrap_err(),
        HramError::NotFound { .. }
    ));
}

#[tokio::test]
async fn delete_system_definition_fails_and_catalog_is_unchanged() {
    let svc = setup().await;
    svc.add_definition(definition("approve_leave", "Leave Management", false))
        .await
        .unwrap();

    let err = svc.delete_definition("approve_leave", ADMIN).await.unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    let grouped = svc.list_definitions().await.unwrap();
    assert!(grouped["Leave Management"]
        .iter()
        .any(|d| d.key == "approve_leave"));
}

#[tokio::test]
async fn delete_custom_definition_cascades() {
    let svc = setup().await;
    svc.add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap();
    svc.set_permission(Role::Manager, "custom_x", true, ADMIN)
        .await
        .unwrap();
    assert!(svc.has_permission(Role::Manager, "custom_x").await.unwrap());

    svc.delete_definition("custom_x", ADMIN).await.unwrap();

    for role in Role::ALL {
        assert!(!svc.has_permission(role, "custom_x").await.unwrap());
    }
    let grouped = svc.list_definitions().await.unwrap();
    assert!(!grouped.contains_key("Custom"));

    let page = svc
        .audit_trail(
            AuditFilter {
                action: Some(AuditAction::Delete),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn every_mutation_appends_exactly_one_record() {
    let svc = setup().await;

    svc.add_definition(definition("custom_x", "Custom", true))
        .await
        .unwrap();
    svc.set_permission(Role::Staff, "custom_x", true, ADMIN)
        .await
        .unwrap();
    svc.set_permission(Role::Staff, "custom_x", false, ADMIN)
        .await
        .unwrap();
    svc.delete_definition("custom_x", ADMIN).await.unwrap();

    let all = svc
        .audit_trail(AuditFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 4);

    for action in [
        AuditAction::Create,
        AuditAction::Enable,
        AuditAction::Disable,
        AuditAction::Delete,
    ] {
        let page = svc
            .audit_trail(
                AuditFilter {
                    action: Some(action),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1, "expected one {action:?} record");
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

async fn leave_template(svc: &Svc) -> Uuid {
    svc.add_definition(definition("request_leave", "Leave Management", false))
        .await
        .unwrap();
    svc.add_definition(definition("approve_leave", "Leave Management", false))
        .await
        .unwrap();

    svc.create_template(CreateTemplate {
        name: "Leave Pack".into(),
        description: "Leave basics".into(),
        category: "Baseline".into(),
        permissions: vec!["request_leave".into(), "approve_leave".into()],
        is_system: false,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn apply_template_unions_and_is_idempotent() {
    let svc = setup().await;
    let template_id = leave_template(&svc).await;

    // A pre-existing grant outside the template must survive the apply.
    svc.add_definition(definition("view_payslips", "Payroll", false))
        .await
        .unwrap();
    svc.set_permission(Role::TeamLeader, "view_payslips", true, ADMIN)
        .await
        .unwrap();

    let results = svc
        .apply_template(template_id, Role::TeamLeader, ADMIN)
        .await
        .unwrap();
    assert!(results.iter().all(|r| r.success));

    let after_once = svc.list_role_permissions(Role::TeamLeader).await.unwrap();
    assert!(after_once.contains("request_leave"));
    assert!(after_once.contains("approve_leave"));
    assert!(after_once.contains("view_payslips"));

    svc.apply_template(template_id, Role::TeamLeader, ADMIN)
        .await
        .unwrap();
    let after_twice = svc.list_role_permissions(Role::TeamLeader).await.unwrap();
    assert_eq!(after_once, after_twice);
}

#[tokio::test]
async fn apply_template_reports_missing_keys_per_item() {
    let svc = setup().await;
    svc.add_definition(definition("request_leave", "Leave Management", false))
        .await
        .unwrap();

    let template = svc
        .create_template(CreateTemplate {
            name: "Partly Stale".into(),
            description: String::new(),
            category: "Custom".into(),
            permissions: vec!["request_leave".into(), "ghost_permission".into()],
            is_system: false,
        })
        .await
        .unwrap();

    let results = svc
        .apply_template(template.id, Role::Staff, ADMIN)
        .await
        .unwrap();

    let ok: Vec<&str> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.key.as_str())
        .collect();
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.key.as_str())
        .collect();

    assert_eq!(ok, vec!["request_leave"]);
    assert_eq!(failed, vec!["ghost_permission"]);
    assert!(svc.has_permission(Role::Staff, "request_leave").await.unwrap());
}

#[tokio::test]
async fn apply_unknown_template_fails() {
    let svc = setup().await;

    let err = svc
        .apply_template(Uuid::new_v4(), Role::Staff, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::NotFound { .. }));
}

#[tokio::test]
async fn template_name_rules() {
    let svc = setup().await;

    let system = svc
        .create_template(CreateTemplate {
            name: "Staff Essentials".into(),
            description: String::new(),
            category: "Baseline".into(),
            permissions: vec![],
            is_system: true,
        })
        .await
        .unwrap();

    // Duplicate names rejected.
    let err = svc
        .create_template(CreateTemplate {
            name: "Staff Essentials".into(),
            description: String::new(),
            category: "Custom".into(),
            permissions: vec![],
            is_system: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    // System templates cannot be renamed or deleted.
    let err = svc
        .update_template(
            system.id,
            UpdateTemplate {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    let err = svc.delete_template(system.id).await.unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    // Their permission lists remain editable.
    let updated = svc
        .update_template(
            system.id,
            UpdateTemplate {
                permissions: Some(vec!["request_leave".into(), "request_leave".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.permissions, vec!["request_leave".to_string()]);
}

#[tokio::test]
async fn duplicate_template_copies_as_non_system() {
    let svc = setup().await;
    let template_id = leave_template(&svc).await;

    let copy = svc
        .duplicate_template(template_id, "Leave Pack (Copy)")
        .await
        .unwrap();

    assert!(!copy.is_system);
    assert_eq!(copy.permissions.len(), 2);
    assert_ne!(copy.id, template_id);
}

#[tokio::test]
async fn export_import_round_trip() {
    let svc = setup().await;
    let template_id = leave_template(&svc).await;

    let mut doc = svc.export_template(template_id).await.unwrap();
    assert_eq!(doc.version, 1);

    // Importing under the original name collides.
    let err = svc.import_template(doc.clone()).await.unwrap_err();
    assert!(matches!(err, HramError::Validation { .. }));

    doc.name = "Leave Pack (Imported)".into();
    let imported = svc.import_template(doc).await.unwrap();
    assert!(!imported.is_system);

    let original = svc.get_template(template_id).await.unwrap();
    assert_eq!(imported.permissions, original.permissions);
}

#[tokio::test]
async fn import_rejects_malformed_documents() {
    let svc = setup().await;
    let template_id = leave_template(&svc).await;
    let doc = svc.export_template(template_id).await.unwrap();

    let mut wrong_version = doc.clone();
    wrong_version.name = "Other".into();
    wrong_version.version = 99;
    assert!(matches!(
        svc.import_template(wrong_version).await.unwrap_err(),
        HramError::Validation { .. }
    ));

    let mut empty_name = doc.clone();
    empty_name.name = "  ".into();
    assert!(matches!(
        svc.import_template(empty_name).await.unwrap_err(),
        HramError::Validation { .. }
    ));

    let mut empty_key = doc;
    empty_key.name = "Other".into();
    empty_key.permissions.push(String::new());
    assert!(matches!(
        svc.import_template(empty_key).await.unwrap_err(),
        HramError::Validation { .. }
    ));
}

// ---------------------------------------------------------------------------
// Bulk employee operations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_set_role_reports_partial_failure() {
    let svc = setup().await;

    let u1 = svc
        .create_employee(CreateEmployee {
            display_name: "Alice".into(),
            email: "alice@example.com".into(),
            role: Role::Staff,
        })
        .await
        .unwrap();
    let missing = Uuid::new_v4();
    let u3 = svc
        .create_employee(CreateEmployee {
            display_name: "Carol".into(),
            email: "carol@example.com".into(),
            role: Role::Staff,
        })
        .await
        .unwrap();

    let results = svc
        .bulk_set_role(&[u1.id, missing, u3.id], Role::TeamLeader)
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].error.is_some());
    assert!(results[2].success);

    // Successful items committed despite the failure in the middle.
    assert_eq!(svc.get_employee(u1.id).await.unwrap().role, Role::TeamLeader);
    assert_eq!(svc.get_employee(u3.id).await.unwrap().role, Role::TeamLeader);
}

#[tokio::test]
async fn employee_roster_exports_as_quoted_csv() {
    let svc = setup().await;

    svc.create_employee(CreateEmployee {
        display_name: "Smith, Jo".into(),
        email: "jo@example.com".into(),
        role: Role::Manager,
    })
    .await
    .unwrap();

    let page = svc.list_employees(Pagination::default()).await.unwrap();
    let csv = hram_access::export::employees_to_csv(&page.items).unwrap();

    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("\"Smith, Jo\""), "embedded comma must be quoted");
    assert!(csv.contains("manager"));
}

#[tokio::test]
async fn bulk_set_status_deactivates() {
    let svc = setup().await;

    let employee = svc
        .create_employee(CreateEmployee {
            display_name: "Alice".into(),
            email: "alice@example.com".into(),
            role: Role::Staff,
        })
        .await
        .unwrap();

    let results = svc.bulk_set_status(&[employee.id], false).await;
    assert!(results[0].success);
    assert!(!svc.get_employee(employee.id).await.unwrap().active);
}

#[tokio::test]
async fn bulk_reset_returns_employees_to_baseline_role() {
    let svc = setup().await;

    let employee = svc
        .create_employee(CreateEmployee {
            display_name: "Mallory".into(),
            email: "mallory@example.com".into(),
            role: Role::Superadmin,
        })
        .await
        .unwrap();

    let results = svc.bulk_reset_permissions(&[employee.id]).await;
    assert!(results[0].success);
    assert_eq!(svc.get_employee(employee.id).await.unwrap().role, Role::Staff);
}

// ---------------------------------------------------------------------------
// Wildcard evaluator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wildcard_short_circuits_only_for_designated_role() {
    let svc = setup().await;
    svc.add_definition(definition("view_reports", "Reports", false))
        .await
        .unwrap();
    svc.set_permission(Role::Manager, "view_reports", true, ADMIN)
        .await
        .unwrap();

    let evaluator = WildcardGrant::new(svc, Role::Superadmin);

    // The designated role passes every check, even for unknown keys.
    assert!(
        evaluator
            .has_permission(Role::Superadmin, "view_reports")
            .await
            .unwrap()
    );
    assert!(
        evaluator
            .has_permission(Role::Superadmin, "nonexistent")
            .await
            .unwrap()
    );

    // Everyone else stays data-driven.
    assert!(
        evaluator
            .has_permission(Role::Manager, "view_reports")
            .await
            .unwrap()
    );
    assert!(
        !evaluator
            .has_permission(Role::Staff, "view_reports")
            .await
            .unwrap()
    );
    assert!(
        !evaluator
            .inner()
            .has_permission(Role::Superadmin, "nonexistent")
            .await
            .unwrap()
    );
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seed_is_idempotent_and_grants_baselines() {
    let svc = setup().await;

    seed_catalog(&svc).await.unwrap();

    let grouped = svc.list_definitions().await.unwrap();
    assert!(grouped.contains_key("Leave Management"));
    assert!(grouped.contains_key("System"));

    let templates = svc.list_templates(Pagination::default()).await.unwrap();
    assert_eq!(templates.total, 4);
    assert!(templates.items.iter().all(|t| t.is_system));

    assert!(svc.has_permission(Role::Staff, "request_leave").await.unwrap());
    assert!(
        svc.has_permission(Role::Superadmin, "manage_permissions")
            .await
            .unwrap()
    );
    assert!(!svc.has_permission(Role::Staff, "manage_payroll").await.unwrap());

    let before: usize = grouped.values().map(|defs| defs.len()).sum();
    seed_catalog(&svc).await.unwrap();
    let after: usize = svc
        .list_definitions()
        .await
        .unwrap()
        .values()
        .map(|defs| defs.len())
        .sum();
    assert_eq!(before, after, "re-seeding must not duplicate definitions");
}
