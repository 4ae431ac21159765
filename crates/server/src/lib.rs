//! HTTP surface for the portal: shared state and router assembly.

pub mod error;
pub mod routes;

use axum::{Router, response::Json as ResponseJson, routing::get};
use db::DBService;
use services::services::auth::IdentityClient;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utils::response::ApiResponse;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub identity: IdentityClient,
}

impl AppState {
    pub fn new(db: DBService, identity: IdentityClient) -> Self {
        Self { db, identity }
    }
}

async fn health() -> ResponseJson<ApiResponse<&'static str>> {
    ResponseJson(ApiResponse::success("ok"))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
