//! 토큰 인증 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - HS512 토큰 발급/검증
//! - 요청을 막지 않는 인증 미들웨어와 경로 규칙 기반 인가
//! - 회원가입/로그인 API
//! - 자격증명 저장소 (메모리, PostgreSQL)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰 인증 및 접근 규칙
//! - [`repository`]: 자격증명 저장소
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{
    AuthError, AuthService, AuthorizationPolicy, RequestIdentity, TokenError, TokenIssuer,
    TokenKeys, TokenValidator, ValidatedClaims,
};
pub use error::ApiErrorResponse;
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use repository::{CredentialStore, MemoryCredentialStore, PgCredentialStore, StoreError};
pub use routes::{build_router, create_api_router};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
