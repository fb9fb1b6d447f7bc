//! Access service configuration.

use hram_core::models::role::Role;

/// Configuration for the access service.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Role employees fall back to when their permissions are reset
    /// (default: `staff`).
    pub default_role: Role,
    /// When `true`, a failed audit append fails the mutation that produced
    /// it. When `false` (the default) the append is advisory: failures are
    /// logged and the mutation still reports success.
    pub strict_audit: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            default_role: Role::Staff,
            strict_audit: false,
        }
    }
}
