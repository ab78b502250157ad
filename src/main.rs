// src/main.rs

use chrono::Utc;
use tokio::net::TcpListener;

use taproom::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taproom=debug,info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new().await;

    // Expired-session sweep. Session lifecycle belongs to the auth layer,
    // not to the storage backends; they only expose the delete operation.
    let sweeper = app_state.storage.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            tick.tick().await;
            match sweeper.delete_expired_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("swept {n} expired sessions"),
                Err(e) => tracing::warn!("session sweep failed: {e}"),
            }
        }
    });

    let app = taproom::app(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind TCP listener");
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await.expect("axum server error");
}
