//! Routes for authentication and post-login routing.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::post,
};
use serde::{Deserialize, Serialize};
use services::services::{
    auth::AuthenticatedUser,
    login_redirect::{LoginIntent, LoginRedirectService, RedirectDecision},
    membership::DbMembershipStore,
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub fallback_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct LoginResponse {
    pub user: AuthenticatedUser,
    pub redirect: RedirectDecision,
}

/// Request body for recomputing a landing route outside the login flow.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct RedirectRouteRequest {
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
    pub fallback_role: Option<String>,
    pub intent: LoginIntent,
}

/// Verify credentials and decide which dashboard the user lands on.
pub async fn login(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let user = state
        .identity
        .sign_in_with_password(&payload.email, &payload.password)
        .await?;

    let store = DbMembershipStore::new(state.db.pool.clone());
    let fallback_role = payload
        .fallback_role
        .as_deref()
        .or(user.profile.role.as_deref());
    let redirect = LoginRedirectService::redirect_route(
        &store,
        Some(&user.email),
        Some(user.id),
        fallback_role,
        LoginIntent::Manual,
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        user,
        redirect,
    })))
}

/// Recompute the landing route for an already-authenticated identity. The
/// auth-state listener calls this after a session restore.
pub async fn redirect_route(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<RedirectRouteRequest>,
) -> Result<ResponseJson<ApiResponse<RedirectDecision>>, ApiError> {
    let store = DbMembershipStore::new(state.db.pool.clone());
    let decision = LoginRedirectService::redirect_route(
        &store,
        payload.email.as_deref(),
        payload.user_id,
        payload.fallback_role.as_deref(),
        payload.intent,
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(decision)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/login", post(login))
            .route("/redirect-route", post(redirect_route)),
    )
}
