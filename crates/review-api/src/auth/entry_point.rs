//! 인증/인가 실패 응답.
//!
//! 인증 계층의 모든 실패는 이 모듈에서 HTTP 응답으로 바뀝니다.
//! 자격증명과 토큰 관련 실패는 항상 4xx이며, 5xx는 저장소 장애와 내부 에러에만 씁니다.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use review_core::RoleName;

use super::policy::Denial;
use super::token::TokenError;
use crate::error::ApiErrorResponse;
use crate::repository::StoreError;

/// 인증 계층 에러.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("이미 사용 중인 사용자 이름입니다")]
    UsernameTaken,

    #[error("입력값이 유효하지 않습니다: {0}")]
    InvalidInput(String),

    #[error("입력값이 유효하지 않습니다")]
    Validation(#[from] validator::ValidationErrors),

    /// 사용자 없음과 비밀번호 불일치를 구분하지 않는다
    #[error("사용자 이름 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("인증이 필요합니다")]
    MissingIdentity,

    #[error("권한이 부족합니다: {required} 역할이 필요합니다")]
    InsufficientRole { required: RoleName },

    #[error("자격증명 저장소 에러: {0}")]
    Store(#[from] StoreError),

    #[error("내부 에러: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::UsernameTaken | AuthError::InvalidInput(_) | AuthError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials | AuthError::Token(_) | AuthError::MissingIdentity => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AuthError::Store(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UsernameTaken => "USERNAME_TAKEN",
            AuthError::InvalidInput(_) | AuthError::Validation(_) => "INVALID_INPUT",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Token(TokenError::Malformed) => "TOKEN_MALFORMED",
            AuthError::Token(TokenError::SignatureInvalid) => "TOKEN_SIGNATURE_INVALID",
            AuthError::Token(TokenError::Expired) => "TOKEN_EXPIRED",
            AuthError::MissingIdentity => "MISSING_IDENTITY",
            AuthError::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            AuthError::Store(_) => "STORE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn to_api_error(&self) -> ApiErrorResponse {
        match self {
            // 내부 상세는 로그에만 남긴다
            AuthError::Store(_) | AuthError::Internal(_) => {
                ApiErrorResponse::new(self.code(), "서버 내부 에러가 발생했습니다")
            }
            AuthError::Validation(errors) => {
                let api_error = ApiErrorResponse::new(self.code(), self.to_string());
                match serde_json::to_value(errors.field_errors()) {
                    Ok(details) => api_error.with_details(details),
                    Err(_) => api_error,
                }
            }
            _ => ApiErrorResponse::new(self.code(), self.to_string()),
        }
    }

    /// 요청 메서드와 경로를 포함한 응답.
    pub fn into_response_for(self, method: &Method, uri: &Uri) -> Response {
        let body = self.to_api_error().with_request_info(method, uri);
        self.respond(body)
    }

    fn respond(self, body: ApiErrorResponse) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Auth request failed");
        }

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            let challenge = match self {
                AuthError::Token(_) => r#"Bearer error="invalid_token""#,
                _ => "Bearer",
            };
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

impl From<Denial> for AuthError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::MissingIdentity => AuthError::MissingIdentity,
            Denial::InsufficientRole { required } => AuthError::InsufficientRole { required },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = self.to_api_error();
        self.respond(body)
    }
}
