//! Role-permission assignment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// The fact that a role holds (or explicitly does not hold) a permission.
///
/// At most one assignment exists per `(role, permission_key)` pair; writes
/// upsert rather than duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub permission_key: String,
    pub enabled: bool,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}
