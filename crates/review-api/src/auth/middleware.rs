//! Axum용 인증/인가 미들웨어.
//!
//! 요청 처리 순서:
//!
//! 1. [`authenticate`]: `Authorization: Bearer <token>` 헤더가 있으면 토큰을 검증하고,
//!    성공하면 [`RequestIdentity`]를 요청 extension에 붙입니다. 헤더가 없거나 토큰이
//!    유효하지 않아도 요청을 막지 않고 신원 없이 다음 단계로 넘깁니다.
//! 2. [`authorize`]: [`AuthorizationPolicy`](super::AuthorizationPolicy)로 경로와 신원을
//!    평가하고, 거부되면 엔트리 포인트 응답(401/403)을 반환합니다.
//!
//! 핸들러는 [`RequestIdentity`] 추출기로 호출자를 받습니다.
//!
//! ```rust,ignore
//! async fn me(identity: RequestIdentity) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.subject)
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::{self, Next},
    response::Response,
    Router,
};
use review_core::RoleName;
use tracing::debug;

use super::entry_point::AuthError;
use super::policy::Denial;
use super::token::{TokenError, TokenValidator, ValidatedClaims};
use crate::metrics::{record_auth_denial, record_token_rejection};
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// 요청 범위 신원.
///
/// 인증 미들웨어가 요청마다 만들어 붙이며, 다른 요청과 공유하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// 사용자 이름
    pub subject: String,
    /// 역할 (토큰 클레임과 1:1)
    pub roles: Vec<RoleName>,
}

impl RequestIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }
}

impl From<ValidatedClaims> for RequestIdentity {
    fn from(claims: ValidatedClaims) -> Self {
        Self {
            subject: claims.subject,
            roles: claims.roles,
        }
    }
}

/// 제시된 토큰이 거부된 이유. 신원 대신 extension에 남는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRejection(pub TokenError);

/// `Authorization` 헤더에서 Bearer 토큰 추출.
///
/// 헤더가 없거나, 문자열이 아니거나, 다른 스킴이면 `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 헤더로부터 신원 확인.
///
/// - `Ok(None)`: 토큰 없음
/// - `Ok(Some(_))`: 유효한 토큰
/// - `Err(_)`: 토큰이 있지만 유효하지 않음
pub fn identify(
    validator: &TokenValidator,
    headers: &HeaderMap,
) -> Result<Option<RequestIdentity>, TokenError> {
    match bearer_token(headers) {
        None => Ok(None),
        Some(token) => validator
            .validate(token)
            .map(|claims| Some(RequestIdentity::from(claims))),
    }
}

/// 인증 미들웨어. 요청을 거부하지 않는다.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    // 이전 단계에서 붙은 신원은 신뢰하지 않는다
    request.extensions_mut().remove::<RequestIdentity>();
    request.extensions_mut().remove::<TokenRejection>();

    match identify(&state.validator, request.headers()) {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
        }
        Ok(None) => {}
        Err(err) => {
            debug!(kind = err.kind(), path = %request.uri().path(), "Bearer token rejected");
            record_token_rejection(err.kind());
            request.extensions_mut().insert(TokenRejection(err));
        }
    }

    next.run(request).await
}

/// 인가 미들웨어. 정책이 거부하면 핸들러를 호출하지 않는다.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = state.policy.evaluate(
        request.uri().path(),
        request.extensions().get::<RequestIdentity>(),
    );
    let denial = match decision {
        Ok(()) => return next.run(request).await,
        Err(denial) => denial,
    };

    let identity = request.extensions().get::<RequestIdentity>();
    let rejection = request.extensions().get::<TokenRejection>().copied();
    let required_role = match &denial {
        Denial::InsufficientRole { required } => Some(required.as_str()),
        Denial::MissingIdentity => None,
    };
    debug!(
        reason = denial.reason(),
        path = %request.uri().path(),
        required_role,
        subject = identity.map(|i| i.subject.as_str()),
        "Request denied"
    );
    record_auth_denial(denial.reason());

    let error = match rejection {
        Some(TokenRejection(err)) if identity.is_none() => AuthError::Token(err),
        _ => AuthError::from(denial),
    };
    error.into_response_for(request.method(), request.uri())
}

/// 인증 → 인가 순서로 미들웨어를 적용한다.
///
/// 모든 라우트를 등록한 뒤 호출해야 합니다.
pub fn apply_auth_layers(router: Router, state: Arc<AppState>) -> Router {
    router
        .layer(middleware::from_fn_with_state(state.clone(), authorize))
        .layer(middleware::from_fn_with_state(state, authenticate))
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .ok_or(AuthError::MissingIdentity)
    }
}

impl<S> OptionalFromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<RequestIdentity>().cloned())
    }
}
