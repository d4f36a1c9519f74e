//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/auth/register` - 회원가입
//! - `/api/auth/login` - 로그인 (토큰 발급)
//! - `/api/me` - 현재 호출자
//! - `/metrics` - Prometheus 메트릭
//! - `/swagger-ui`, `/api-docs/openapi.json` - API 문서

pub mod auth;
pub mod health;
pub mod me;

pub use auth::{auth_router, CredentialsRequest, LoginResponse, RegisterResponse, TOKEN_TYPE};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use me::{me_router, MeResponse};

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::auth::apply_auth_layers;
use crate::error::ApiErrorResponse;
use crate::middleware::metrics_layer;
use crate::openapi::swagger_ui_router;
use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/auth", auth_router())
        .nest("/api/me", me_router())
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 등록되지 않은 경로.
async fn not_found(uri: Uri) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse::new(
            "NOT_FOUND",
            format!("경로를 찾을 수 없습니다: {}", uri.path()),
        )),
    )
}

/// 인증/인가와 메트릭 미들웨어까지 적용한 라우터.
///
/// `metrics_handle`이 없으면 `/metrics`를 등록하지 않습니다.
/// 전송 계층 미들웨어(trace, timeout, CORS)는 호출자가 추가합니다.
pub fn build_router(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .merge(create_api_router().with_state(state.clone()))
        .merge(swagger_ui_router());

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(handle),
        );
    }

    apply_auth_layers(router.fallback(not_found), state)
        .layer(middleware::from_fn(metrics_layer))
}
