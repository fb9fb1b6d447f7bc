//! HRAM Access — the single write path for the permission catalog, the
//! role-permission map, templates, and bulk employee operations, plus the
//! read-side grant evaluator.
//!
//! Every mutation funnels through [`AccessService`] so audit emission is
//! centralized and cannot be bypassed by a direct repository write.

pub mod config;
pub mod evaluate;
pub mod export;
pub mod seed;
pub mod service;

pub use config::AccessConfig;
pub use evaluate::{PermissionEvaluator, WildcardGrant};
pub use service::{AccessService, BulkItemResult, DefinitionPatch, TemplateApplyResult};
