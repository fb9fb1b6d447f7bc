//! Audit trail domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Enable,
    Disable,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
            AuditAction::Enable => "Enable",
            AuditAction::Disable => "Disable",
        }
    }

    pub fn parse(s: &str) -> Option<AuditAction> {
        match s {
            "Create" => Some(AuditAction::Create),
            "Update" => Some(AuditAction::Update),
            "Delete" => Some(AuditAction::Delete),
            "Enable" => Some(AuditAction::Enable),
            "Disable" => Some(AuditAction::Disable),
            _ => None,
        }
    }
}

/// One immutable entry of the permission change history.
///
/// `role = None` means the action affected the global catalog rather than a
/// specific role's assignment set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    pub permission_key: String,
    pub role: Option<Role>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditRecord {
    pub action: AuditAction,
    pub permission_key: String,
    pub role: Option<Role>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub changed_by: String,
}
