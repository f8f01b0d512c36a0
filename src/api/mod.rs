mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::Database;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

pub fn create_router(db: Database, config: AppConfig) -> Router {
    let cors = cors_layer(&config);
    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
    };

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let admin = Router::new()
        .route("/invitations", post(handlers::create_invitation))
        .route("/invitations/pending", get(handlers::list_pending_invitations))
        .route("/invitations/approve/{email}", put(handlers::approve_invitation))
        .route("/invitations/reject/{email}", put(handlers::reject_invitation))
        .route_layer(from_fn(middleware::admin_middleware));

    let authenticated = Router::new()
        // Session
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        // Individuals
        .route("/individuals", post(handlers::create_individual))
        .route("/individuals/{id}", get(handlers::get_individual))
        .route("/individuals/{id}", put(handlers::update_individual))
        .route("/individuals/{id}/children", post(handlers::add_child))
        // Relationships
        .route(
            "/relationships/individual/{id}",
            get(handlers::list_individual_relationships),
        )
        .route("/relationships", post(handlers::create_relationship))
        .route("/relationships/{id}", delete(handlers::delete_relationship))
        // Tree
        .route("/tree", get(handlers::get_tree))
        .route("/tree/render", get(handlers::render_tree))
        .route("/tree/individuals", get(handlers::tree_individuals))
        .route("/tree/relationships", get(handlers::tree_relationships))
        .merge(admin)
        .route_layer(from_fn_with_state(db, middleware::auth_middleware));

    Router::new()
        .nest("/api/v1", public.merge(authenticated))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let Some(origins) = &config.cors_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
