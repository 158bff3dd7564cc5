use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

pub mod auth;
pub mod dashboard;
pub mod navigation;
pub mod neighborhoods;
pub mod services;
pub mod users;

use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service healthy")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, auth, and the identity-
/// guarded application routes.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let app = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", put(users::update).delete(users::delete))
        .route("/neighborhoods", get(neighborhoods::list).post(neighborhoods::create))
        .route(
            "/neighborhoods/:id",
            put(neighborhoods::update).delete(neighborhoods::delete),
        )
        .route("/neighborhoods/fee/:name", get(neighborhoods::fee))
        .route("/board", get(services::board_view))
        .route("/board/cancelled", get(services::cancelled_view))
        .route("/services", post(services::create))
        .route("/services/:id", put(services::edit))
        .route("/services/:id/status/:target", post(services::transition))
        .route("/services/:id/order/:direction", post(services::move_order))
        .route("/dashboard", get(dashboard::report))
        .route("/route-links", get(navigation::route_links))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_identity))
        .with_state(state);

    app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
