//! HTTP surface of Launchpad: registration, signup, sign-in, sessions, provider
//! discovery and OAuth.

mod error;
mod oauth_state;
mod state;
mod util;

pub mod docs;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use oauth_state::OAuthStateStore;
pub use state::{AppState, Registration, Signup};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/providers", get(routes::auth::providers))
        .route("/api/auth/session", get(routes::auth::current_session))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route(
            "/api/auth/oauth/:provider/login",
            get(routes::auth::oauth_login),
        )
        .route(
            "/api/auth/oauth/:provider/callback",
            post(routes::auth::oauth_callback),
        )
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
