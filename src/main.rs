use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use karwan_api::build_router;
use karwan_api::config::{MailConfig, StorageConfig};
use karwan_api::database::connection::get_db_client;
use karwan_api::services::{mail::MailService, storage::StorageService};
use karwan_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let db = get_db_client().await;
    let app_state = initialize_app_state(db);

    let app = build_router(app_state);
    start_server(app).await;
}

// Storage and mail come up only when their credentials are present; the
// booking workflow itself runs either way.
fn initialize_app_state(db: mongodb::Database) -> AppState {
    let mut app_state = AppState::new(db);

    match StorageConfig::from_env() {
        Ok(config) => {
            app_state = app_state.with_storage(Arc::new(StorageService::new(config)));
            tracing::info!("✅ Storage service initialized");
        }
        Err(e) => {
            tracing::warn!("Storage service disabled: {}", e);
            tracing::warn!("Payment submissions will answer 503; image keys pass through unsigned");
        }
    }

    match MailConfig::from_env().and_then(MailService::new) {
        Ok(mail) => {
            app_state = app_state.with_mail(Arc::new(mail));
            tracing::info!("✅ Mail service initialized");
        }
        Err(e) => {
            tracing::warn!("Mail service disabled: {}", e);
        }
    }

    app_state
}

async fn start_server(app: Router) {
    let port = std::env::var("PORT").unwrap_or_else(|_| "10000".to_string());
    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(10000)));

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            axum::serve(listener, app).await.unwrap();
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}
