// src/config.rs

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use crate::storage::{MemStorage, PgStorage, Storage, TenantDeletePolicy};

/// Shared state handed to every handler. Exactly one storage instance is
/// constructed per process, at startup, and never torn down.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub session_ttl: chrono::Duration,
}

impl AppState {
    /// Loads configuration from the environment and constructs the storage
    /// backend. A persistent backend that cannot connect is fatal: log and
    /// exit rather than limp along without a store.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok();

        // STORAGE_BACKEND=memory|postgres; defaults to postgres when a
        // DATABASE_URL is configured, memory otherwise.
        let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| {
            if database_url.is_some() {
                "postgres".to_string()
            } else {
                "memory".to_string()
            }
        });

        let delete_policy = match env::var("TENANT_DELETE_POLICY").as_deref() {
            Ok("cascade") => TenantDeletePolicy::Cascade,
            Ok("restrict") | Err(_) => TenantDeletePolicy::Restrict,
            Ok(other) => {
                tracing::error!("invalid TENANT_DELETE_POLICY '{other}' (use restrict|cascade)");
                std::process::exit(1);
            }
        };

        let session_ttl_hours: i64 = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        let storage: Arc<dyn Storage> = match backend.as_str() {
            "memory" => {
                tracing::info!("using in-memory storage backend (demo/test mode)");
                Arc::new(MemStorage::new(delete_policy))
            }
            "postgres" => {
                let url = database_url.unwrap_or_else(|| {
                    tracing::error!("STORAGE_BACKEND=postgres requires DATABASE_URL");
                    std::process::exit(1);
                });

                let db_pool = match PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(&url)
                    .await
                {
                    Ok(pool) => {
                        tracing::info!("database connection established");
                        pool
                    }
                    Err(e) => {
                        tracing::error!("failed to connect to the database: {e:?}");
                        std::process::exit(1);
                    }
                };

                if let Err(e) = sqlx::migrate!().run(&db_pool).await {
                    tracing::error!("failed to run database migrations: {e:?}");
                    std::process::exit(1);
                }

                Arc::new(PgStorage::new(db_pool, delete_policy))
            }
            other => {
                tracing::error!("invalid STORAGE_BACKEND '{other}' (use memory|postgres)");
                std::process::exit(1);
            }
        };

        Self {
            storage,
            session_ttl: chrono::Duration::hours(session_ttl_hours),
        }
    }
}
