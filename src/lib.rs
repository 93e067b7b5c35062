// src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use services::{identity::IdentityProvider, opportunity_store::OpportunityStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OpportunityStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub mod entities {
    pub mod prelude;
    pub mod opportunities;
    pub mod opportunity_interests;
}

pub mod services {
    pub mod access_policy;
    pub mod identity;
    pub mod opportunity_store;
    pub mod opportunity_validator;
    pub mod pg_opportunity_store;
}

pub mod config;
pub mod models;
pub mod handlers;

/// Build the HTTP router
///
/// `cors_origin` restricts browser access to one origin; `None` allows any.
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Router {
    use handlers::{health, opportunity};

    let cors = match cors_origin.and_then(|o| o.parse::<axum::http::HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/opportunities",
            get(opportunity::list_opportunities).post(opportunity::create_opportunity),
        )
        .route(
            "/api/opportunities/{id}",
            get(opportunity::get_opportunity)
                .patch(opportunity::update_opportunity)
                .delete(opportunity::delete_opportunity),
        )
        .route(
            "/api/opportunities/{id}/documents",
            get(opportunity::list_documents),
        )
        .route(
            "/api/opportunities/{id}/interest",
            post(opportunity::express_interest),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
