//! HRAM Server — application entry point.

use hram_access::seed::seed_catalog;
use hram_access::{AccessConfig, AccessService};
use hram_db::repository::{
    SurrealAuditLogRepository, SurrealEmployeeRepository, SurrealPermissionCatalogRepository,
    SurrealRolePermissionRepository, SurrealTemplateRepository,
};
use hram_db::{DbConfig, DbManager, run_migrations};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hram=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("Starting HRAM server...");

    let db_config = DbConfig {
        url: env_or("HRAM_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("HRAM_DB_NAMESPACE", "hram"),
        database: env_or("HRAM_DB_DATABASE", "main"),
        username: env_or("HRAM_DB_USERNAME", "root"),
        password: env_or("HRAM_DB_PASSWORD", "root"),
    };

    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Migrations failed");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let service = AccessService::new(
        SurrealPermissionCatalogRepository::new(db.clone()),
        SurrealRolePermissionRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        SurrealTemplateRepository::new(db.clone()),
        SurrealEmployeeRepository::new(db),
        AccessConfig::default(),
    );

    if let Err(e) = seed_catalog(&service).await {
        tracing::error!(error = %e, "Catalog seeding failed");
        std::process::exit(1);
    }

    tracing::info!("HRAM core ready");

    // TODO: Start admin REST API

    tracing::info!("HRAM server stopped.");
}
