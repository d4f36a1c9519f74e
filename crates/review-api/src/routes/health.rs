//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.
//! 인증 없이 접근 가능합니다.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "unhealthy")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// 자격증명 저장소 상태
    pub credential_store: ComponentStatus,

    /// 서명 키 상태
    pub signing_key: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능", body = String))
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 저장소에 연결할 수 없으면 503을 반환합니다.
/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "요청 처리 가능", body = HealthResponse),
        (status = 503, description = "자격증명 저장소 연결 실패", body = HealthResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = state.store.backend();
    let (overall_status, status_code, store_status) = if state.is_store_healthy().await {
        ("healthy", StatusCode::OK, ComponentStatus::up_with_info(backend))
    } else {
        (
            "unhealthy",
            StatusCode::SERVICE_UNAVAILABLE,
            ComponentStatus::down(format!("{} 연결 실패", backend)),
        )
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            credential_store: store_status,
            signing_key: ComponentStatus::up_with_info(state.key_source.to_string()),
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let app = Router::new().route("/health", get(health_check));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_reports_store() {
        use crate::state::create_test_state;

        let state = Arc::new(create_test_state());
        let app = Router::new()
            .route("/health/ready", get(health_ready))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "healthy");
        assert!(!health.version.is_empty());
        assert_eq!(health.components.credential_store.status, "up");
        assert_eq!(
            health.components.credential_store.message.as_deref(),
            Some("memory")
        );
    }

    #[test]
    fn test_component_status_variants() {
        let up = ComponentStatus::up_with_info("postgres");
        assert_eq!(up.status, "up");

        let down = ComponentStatus::down("error");
        assert_eq!(down.status, "down");
        assert_eq!(down.message, Some("error".to_string()));
    }
}
