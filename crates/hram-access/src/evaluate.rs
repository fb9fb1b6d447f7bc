//! Grant evaluation — the read path consulted by navigation, route
//! guards, and action buttons.
//!
//! The core evaluator is pure data-driven: a grant exists only if an
//! enabled assignment references an active definition. The "one role
//! always passes" policy is deliberately NOT built into it; it is layered
//! on top as [`WildcardGrant`] so a catalog gap can never be silently
//! masked inside the evaluator itself.

use hram_core::error::HramResult;
use hram_core::models::role::Role;
use hram_core::repository::{
    AuditLogRepository, EmployeeRepository, PermissionCatalogRepository,
    RolePermissionRepository, TemplateRepository,
};

use crate::service::AccessService;

/// Answers whether a role holds a permission. Absence is deny.
pub trait PermissionEvaluator: Send + Sync {
    fn has_permission(
        &self,
        role: Role,
        key: &str,
    ) -> impl Future<Output = HramResult<bool>> + Send;
}

impl<C, R, A, T, E> PermissionEvaluator for AccessService<C, R, A, T, E>
where
    C: PermissionCatalogRepository,
    R: RolePermissionRepository,
    A: AuditLogRepository,
    T: TemplateRepository,
    E: EmployeeRepository,
{
    async fn has_permission(&self, role: Role, key: &str) -> HramResult<bool> {
        self.evaluate_grant(role, key).await
    }
}

/// Decorator granting every permission to one designated role and
/// delegating all other checks to the wrapped evaluator.
pub struct WildcardGrant<E> {
    inner: E,
    wildcard_role: Role,
}

impl<E: PermissionEvaluator> WildcardGrant<E> {
    pub fn new(inner: E, wildcard_role: Role) -> Self {
        Self {
            inner,
            wildcard_role,
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: PermissionEvaluator> PermissionEvaluator for WildcardGrant<E> {
    async fn has_permission(&self, role: Role, key: &str) -> HramResult<bool> {
        if role == self.wildcard_role {
            return Ok(true);
        }
        self.inner.has_permission(role, key).await
    }
}
