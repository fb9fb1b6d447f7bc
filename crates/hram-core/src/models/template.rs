//! Permission template domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version written into exported template documents.
pub const TEMPLATE_DOCUMENT_VERSION: u32 = 1;

/// A named, reusable bundle of permission keys that can be applied to a
/// role in one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Permission keys; deduplicated on write, order not meaningful.
    pub permissions: Vec<String>,
    /// System templates cannot be deleted or renamed.
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: String,
    pub category: String,
    pub permissions: Vec<String>,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Portable export form of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub name: String,
    pub description: String,
    pub category: String,
    pub permissions: Vec<String>,
    pub exported_at: DateTime<Utc>,
    pub version: u32,
}
