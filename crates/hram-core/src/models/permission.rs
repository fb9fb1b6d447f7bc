//! Permission definition domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the organization-wide permission catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Stable identifier (e.g., `approve_leave`). Immutable for system
    /// definitions, and for custom definitions once any role references it.
    pub key: String,
    pub label: String,
    pub description: String,
    /// Grouping tag; one of the built-in categories or `"Custom"`.
    pub category: String,
    /// `false` for seeded system definitions, `true` for admin-added ones.
    pub is_custom: bool,
    /// Soft-disable flag. Inactive definitions are hidden from the catalog
    /// listing and evaluate as deny.
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionDefinition {
    pub key: String,
    pub label: String,
    pub description: String,
    pub category: String,
    pub is_custom: bool,
    pub created_by: String,
}

/// Partial update. `key` renames are handled separately because the key is
/// the record identity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePermissionDefinition {
    pub label: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}
