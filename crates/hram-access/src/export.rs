//! CSV encoders for bulk exports.
//!
//! Values with embedded delimiters, quotes, or newlines are quoted per
//! RFC 4180; the header row carries the field names.

use hram_core::error::{HramError, HramResult};
use hram_core::models::audit::AuditRecord;
use hram_core::models::employee::Employee;

fn csv_internal(e: impl std::fmt::Display) -> HramError {
    HramError::Internal(e.to_string())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> HramResult<String> {
    let bytes = writer.into_inner().map_err(csv_internal)?;
    String::from_utf8(bytes).map_err(csv_internal)
}

/// Encode employees as CSV.
pub fn employees_to_csv(employees: &[Employee]) -> HramResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["id", "display_name", "email", "role", "active"])
        .map_err(csv_internal)?;

    for employee in employees {
        writer
            .write_record(&[
                employee.id.to_string(),
                employee.display_name.clone(),
                employee.email.clone(),
                employee.role.as_str().to_string(),
                employee.active.to_string(),
            ])
            .map_err(csv_internal)?;
    }

    finish(writer)
}

/// Encode audit records as CSV. Snapshot values are serialized as compact
/// JSON; absent fields become empty cells.
pub fn audit_to_csv(records: &[AuditRecord]) -> HramResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "id",
            "action",
            "permission_key",
            "role",
            "old_value",
            "new_value",
            "changed_by",
            "changed_at",
        ])
        .map_err(csv_internal)?;

    for record in records {
        writer
            .write_record(&[
                record.id.to_string(),
                record.action.as_str().to_string(),
                record.permission_key.clone(),
                record
                    .role
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_default(),
                record
                    .old_value
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                record
                    .new_value
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                record.changed_by.clone(),
                record.changed_at.to_rfc3339(),
            ])
            .map_err(csv_internal)?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use hram_core::models::audit::AuditAction;
    use hram_core::models::role::Role;
    use uuid::Uuid;

    use super::*;

    fn employee(display_name: &str, email: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            email: email.into(),
            role: Role::Staff,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn employees_csv_has_header_and_rows() {
        let rows = vec![employee("Alice", "alice@example.com")];
        let csv = employees_to_csv(&rows).unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("id,display_name,email,role,active"));
        let row = lines.next().unwrap();
        assert!(row.contains("alice@example.com"));
        assert!(row.ends_with("staff,true"));
    }

    #[test]
    fn embedded_delimiters_are_quoted() {
        let rows = vec![employee("Smith, \"Jo\"", "jo@example.com")];
        let csv = employees_to_csv(&rows).unwrap();

        // The comma and quotes must survive round-trip quoting.
        assert!(csv.contains("\"Smith, \"\"Jo\"\"\""));
    }

    #[test]
    fn audit_csv_serializes_optional_fields() {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            action: AuditAction::Enable,
            permission_key: "approve_leave".into(),
            role: Some(Role::Manager),
            old_value: None,
            new_value: Some(serde_json::json!({ "enabled": true })),
            changed_by: "admin@example.com".into(),
            changed_at: Utc::now(),
        };

        let csv = audit_to_csv(std::slice::from_ref(&record)).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert!(row.contains("Enable"));
        assert!(row.contains("manager"));
        // Compact JSON contains a comma-free payload here, but the quotes
        // inside must be escaped.
        assert!(row.contains("\"{\"\"enabled\"\":true}\""));
    }
}
