use std::sync::Arc;

use captable_api::config::AppConfig;
use captable_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    captable_observability::init();

    let config = AppConfig::from_env();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("failed to connect to database");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is not persisted)");
            Arc::new(MemoryStore::new())
        }
    };

    let app = captable_api::app::build_app(&config, store).await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
