//! Built-in catalog content and idempotent seeding.
//!
//! System definitions and templates are created once, attributed to the
//! `system` actor; re-running the seed against a populated store is a
//! no-op. Roles with no assignment rows at all receive their baseline
//! template grants.

use hram_core::error::{HramError, HramResult};
use hram_core::models::permission::CreatePermissionDefinition;
use hram_core::models::role::Role;
use hram_core::models::template::CreateTemplate;
use hram_core::repository::{
    AuditLogRepository, EmployeeRepository, PermissionCatalogRepository,
    RolePermissionRepository, TemplateRepository,
};
use tracing::info;

use crate::service::AccessService;

/// Actor recorded on seed-time audit entries.
pub const SYSTEM_ACTOR: &str = "system";

struct BuiltinDefinition {
    key: &'static str,
    label: &'static str,
    description: &'static str,
    category: &'static str,
}

const BUILTIN_DEFINITIONS: &[BuiltinDefinition] = &[
    // Leave Management
    BuiltinDefinition {
        key: "request_leave",
        label: "Request Leave",
        description: "Submit leave requests for oneself",
        category: "Leave Management",
    },
    BuiltinDefinition {
        key: "approve_leave",
        label: "Approve Leave",
        description: "Approve or reject leave requests from direct reports",
        category: "Leave Management",
    },
    BuiltinDefinition {
        key: "view_team_leave",
        label: "View Team Leave",
        description: "See the leave calendar and balances of the team",
        category: "Leave Management",
    },
    BuiltinDefinition {
        key: "manage_leave_policies",
        label: "Manage Leave Policies",
        description: "Configure leave types, accrual rules, and carry-over",
        category: "Leave Management",
    },
    // Team & Users
    BuiltinDefinition {
        key: "view_team",
        label: "View Team",
        description: "Browse team member profiles",
        category: "Team & Users",
    },
    BuiltinDefinition {
        key: "manage_users",
        label: "Manage Users",
        description: "Create, edit, and deactivate employee accounts",
        category: "Team & Users",
    },
    BuiltinDefinition {
        key: "assign_roles",
        label: "Assign Roles",
        description: "Change the access role of employee accounts",
        category: "Team & Users",
    },
    // Performance
    BuiltinDefinition {
        key: "conduct_reviews",
        label: "Conduct Reviews",
        description: "Run performance reviews for direct reports",
        category: "Performance",
    },
    BuiltinDefinition {
        key: "view_team_reviews",
        label: "View Team Reviews",
        description: "Read completed reviews across the team",
        category: "Performance",
    },
    BuiltinDefinition {
        key: "manage_review_cycles",
        label: "Manage Review Cycles",
        description: "Open, schedule, and close review cycles",
        category: "Performance",
    },
    // Payroll
    BuiltinDefinition {
        key: "view_payslips",
        label: "View Payslips",
        description: "View one's own payslips",
        category: "Payroll",
    },
    BuiltinDefinition {
        key: "manage_payroll",
        label: "Manage Payroll",
        description: "Edit compensation records and publish payslips",
        category: "Payroll",
    },
    // Reports
    BuiltinDefinition {
        key: "view_reports",
        label: "View Reports",
        description: "Open organization dashboards and reports",
        category: "Reports",
    },
    BuiltinDefinition {
        key: "export_data",
        label: "Export Data",
        description: "Download CSV and JSON exports",
        category: "Reports",
    },
    // System
    BuiltinDefinition {
        key: "manage_permissions",
        label: "Manage Permissions",
        description: "Edit the permission catalog and role assignments",
        category: "System",
    },
    BuiltinDefinition {
        key: "view_audit_log",
        label: "View Audit Log",
        description: "Read the permission change history",
        category: "System",
    },
];

struct BuiltinTemplate {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    permissions: &'static [&'static str],
}

const BUILTIN_TEMPLATES: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        name: "Staff Essentials",
        description: "Self-service basics every employee needs",
        category: "Baseline",
        permissions: &["request_leave", "view_payslips"],
    },
    BuiltinTemplate {
        name: "Team Leader Toolkit",
        description: "Staff essentials plus team oversight",
        category: "Baseline",
        permissions: &[
            "request_leave",
            "view_payslips",
            "view_team",
            "view_team_leave",
            "approve_leave",
            "conduct_reviews",
        ],
    },
    BuiltinTemplate {
        name: "Manager Suite",
        description: "Full people-management toolset",
        category: "Baseline",
        permissions: &[
            "request_leave",
            "view_payslips",
            "view_team",
            "view_team_leave",
            "approve_leave",
            "conduct_reviews",
            "manage_users",
            "manage_leave_policies",
            "view_team_reviews",
            "manage_review_cycles",
            "manage_payroll",
            "view_reports",
            "export_data",
        ],
    },
    BuiltinTemplate {
        name: "Full Administration",
        description: "Every permission, including catalog administration",
        category: "Baseline",
        permissions: &[
            "request_leave",
            "approve_leave",
            "view_team_leave",
            "manage_leave_policies",
            "view_team",
            "manage_users",
            "assign_roles",
            "conduct_reviews",
            "view_team_reviews",
            "manage_review_cycles",
            "view_payslips",
            "manage_payroll",
            "view_reports",
            "export_data",
            "manage_permissions",
            "view_audit_log",
        ],
    },
];

/// Baseline template applied to each role on first seed.
const BASELINE_TEMPLATES: &[(Role, &str)] = &[
    (Role::Staff, "Staff Essentials"),
    (Role::TeamLeader, "Team Leader Toolkit"),
    (Role::Manager, "Manager Suite"),
    (Role::Superadmin, "Full Administration"),
];

/// Seed system definitions, system templates, and baseline role grants.
pub async fn seed_catalog<C, R, A, T, E>(service: &AccessService<C, R, A, T, E>) -> HramResult<()>
where
    C: PermissionCatalogRepository,
    R: RolePermissionRepository,
    A: AuditLogRepository,
    T: TemplateRepository,
    E: EmployeeRepository,
{
    let mut created = 0;
    for def in BUILTIN_DEFINITIONS {
        match service.get_definition(def.key).await {
            Ok(_) => {}
            Err(HramError::NotFound { .. }) => {
                service
                    .add_definition(CreatePermissionDefinition {
                        key: def.key.into(),
                        label: def.label.into(),
                        description: def.description.into(),
                        category: def.category.into(),
                        is_custom: false,
                        created_by: SYSTEM_ACTOR.into(),
                    })
                    .await?;
                created += 1;
            }
            Err(e) => return Err(e),
        }
    }
    if created > 0 {
        info!(count = created, "Seeded system permission definitions");
    }

    for tpl in BUILTIN_TEMPLATES {
        match service.get_template_by_name(tpl.name).await {
            Ok(_) => {}
            Err(HramError::NotFound { .. }) => {
                service
                    .create_template(CreateTemplate {
                        name: tpl.name.into(),
                        description: tpl.description.into(),
                        category: tpl.category.into(),
                        permissions: tpl.permissions.iter().map(|s| s.to_string()).collect(),
                        is_system: true,
                    })
                    .await?;
                info!(name = tpl.name, "Seeded system template");
            }
            Err(e) => return Err(e),
        }
    }

    for (role, template_name) in BASELINE_TEMPLATES {
        if service.list_role_assignments(*role).await?.is_empty() {
            let template = service.get_template_by_name(template_name).await?;
            service
                .apply_template(template.id, *role, SYSTEM_ACTOR)
                .await?;
            info!(role = role.as_str(), template = template_name, "Applied baseline grants");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_template_keys_exist_in_catalog() {
        for tpl in BUILTIN_TEMPLATES {
            for key in tpl.permissions {
                assert!(
                    BUILTIN_DEFINITIONS.iter().any(|d| d.key == *key),
                    "template '{}' references unknown key '{key}'",
                    tpl.name
                );
            }
        }
    }

    #[test]
    fn every_role_has_a_baseline_template() {
        for role in Role::ALL {
            assert!(
                BASELINE_TEMPLATES.iter().any(|(r, _)| *r == role),
                "role '{role}' has no baseline template"
            );
        }
    }
}
