//! 회원가입/로그인 endpoint.
//!
//! - `POST /api/auth/register`
//! - `POST /api/auth/login`
//!
//! 두 경로 모두 기본 규칙에서 인증 없이 접근 가능합니다.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::auth::AuthError;
use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// 토큰 타입 (`Authorization` 헤더 스킴).
pub const TOKEN_TYPE: &str = "Bearer";

/// 사용자 이름에는 공백과 쉼표를 쓸 수 없다.
fn validate_username_chars(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(|c| c == ',' || c.is_whitespace()) {
        return Err(ValidationError::new("invalid_username_chars")
            .with_message("사용자 이름에는 공백과 쉼표를 쓸 수 없습니다".into()));
    }
    Ok(())
}

/// 회원가입/로그인 요청 본문.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    #[validate(
        length(min = 1, max = 64, message = "사용자 이름은 1-64자여야 합니다"),
        custom(function = "validate_username_chars")
    )]
    #[schema(example = "ash")]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "비밀번호는 1-128자여야 합니다"))]
    #[schema(example = "Pikachu025!", format = Password)]
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// 회원가입 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub username: String,
    pub message: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// 서명된 토큰
    pub token: String,
    /// 항상 "Bearer"
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: u64,
}

fn parse_body(
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<CredentialsRequest, AuthError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| AuthError::InvalidInput(rejection.body_text()))
}

/// 회원가입.
///
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "등록 완료", body = RegisterResponse),
        (status = 400, description = "USERNAME_TAKEN 또는 INVALID_INPUT", body = ApiErrorResponse),
        (status = 500, description = "저장소 오류", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let request = parse_body(body)?;
    request.validate()?;

    state.auth.register(&request.username, &request.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username: request.username,
            message: "등록되었습니다".to_string(),
        }),
    ))
}

/// 로그인.
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "토큰 발급", body = LoginResponse),
        (status = 401, description = "INVALID_CREDENTIALS", body = ApiErrorResponse),
        (status = 500, description = "저장소 오류", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let request = parse_body(body)?;

    let login = state.auth.login(&request.username, &request.password).await?;

    Ok(Json(LoginResponse {
        token: login.token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: login.expires_in,
    }))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
