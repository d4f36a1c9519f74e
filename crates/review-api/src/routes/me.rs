//! 현재 호출자 정보.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::RequestIdentity;
use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// 호출자 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub username: String,
    /// 토큰에 담긴 역할 (할당 순서)
    pub roles: Vec<String>,
}

/// 토큰 신원 조회.
///
/// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "인증된 호출자", body = MeResponse),
        (status = 401, description = "MISSING_IDENTITY 또는 TOKEN_*", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(identity: RequestIdentity) -> Json<MeResponse> {
    Json(MeResponse {
        username: identity.subject,
        roles: identity.roles.into_iter().map(String::from).collect(),
    })
}

pub fn me_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(me))
}
