//! 인증 및 권한 부여.
//!
//! HS512 JWT 기반 인증과 경로별 역할 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`TokenIssuer`] / [`TokenValidator`]: 토큰 발급과 검증
//! - [`authenticate`] / [`authorize`]: 요청 파이프라인 미들웨어
//! - [`AuthorizationPolicy`]: 순서대로 평가하는 경로 규칙 (첫 일치 우선)
//! - [`AuthError`]: 인증/인가 실패 응답
//! - [`AuthService`]: 회원가입과 로그인
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let router = apply_auth_layers(create_api_router(), state.clone());
//!
//! async fn me(identity: RequestIdentity) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.subject)
//! }
//! ```

mod entry_point;
mod middleware;
mod password;
mod policy;
mod service;
mod token;

pub use entry_point::AuthError;
pub use middleware::{
    apply_auth_layers, authenticate, authorize, bearer_token, identify, RequestIdentity,
    TokenRejection,
};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    PasswordError,
};
pub use policy::{
    AccessRequirement, AccessRule, AuthorizationPolicy, Denial, PolicyError, RoutePattern,
};
pub use service::{AuthService, LoginToken};
pub use token::{
    TokenError, TokenIssueError, TokenIssuer, TokenKeys, TokenValidator, ValidatedClaims,
    TOKEN_ALGORITHM,
};
