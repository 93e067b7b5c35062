use dealroom_backend::{
    build_router,
    config::AppConfig,
    services::{
        identity::GatewayHeaderIdentity,
        opportunity_store::{InMemoryOpportunityStore, OpportunityStore},
        pg_opportunity_store::PgOpportunityStore,
    },
    AppState,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dealroom_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let store: Arc<dyn OpportunityStore> = match config.database_url {
        Some(ref database_url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(database_url)
                .await
                .expect("Failed to connect to database");

            if config.run_migrations {
                tracing::info!("Running migrations...");
                migration::Migrator::up(&db, None)
                    .await
                    .expect("Failed to run migrations");
            }

            Arc::new(PgOpportunityStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Arc::new(InMemoryOpportunityStore::new())
        }
    };

    let state = AppState {
        store,
        identity: Arc::new(GatewayHeaderIdentity::new()),
    };

    let app = build_router(state, config.cors_allowed_origin.as_deref());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("Listener has no local address")
    );

    axum::serve(listener, app).await.expect("Server error");
}
