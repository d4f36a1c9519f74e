//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::{Method, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "TOKEN_EXPIRED",
///   "message": "토큰이 만료되었습니다",
///   "timestamp": 1738300800,
///   "method": "GET",
///   "path": "/api/me"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CREDENTIALS", "MISSING_IDENTITY")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (입력 검증 실패 필드 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드 (GET, POST 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// ```
    /// use review_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("INVALID_CREDENTIALS", "bad credentials");
    /// assert_eq!(error.code(), "INVALID_CREDENTIALS");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보를 추가합니다.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    ///
    /// 쿼리 문자열은 포함하지 않습니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("INVALID_CREDENTIALS", "Test message");
        assert_eq!(error.code, "INVALID_CREDENTIALS");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
        assert!(error.method.is_none());
        assert!(error.path.is_none());
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let error = ApiErrorResponse::new("MISSING_IDENTITY", "인증이 필요합니다");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains("timestamp"));
        assert!(!json.contains("details"));
        assert!(!json.contains("method"));
        assert!(!json.contains("path"));
        assert!(json.contains(r#""code":"MISSING_IDENTITY""#));
    }

    #[test]
    fn test_with_details() {
        let error = ApiErrorResponse::new("INVALID_INPUT", "Invalid input")
            .with_details(serde_json::json!({"username": ["length"]}));

        assert_eq!(error.details.unwrap()["username"][0], "length");
    }

    #[test]
    fn test_with_request_info_drops_query() {
        let uri: Uri = "/api/auth/login?next=/api/me".parse().unwrap();
        let error = ApiErrorResponse::new("INVALID_CREDENTIALS", "bad credentials")
            .with_request_info(&Method::POST, &uri);

        assert_eq!(error.method.as_deref(), Some("POST"));
        assert_eq!(error.path.as_deref(), Some("/api/auth/login"));
        assert_eq!(error.to_string(), "[INVALID_CREDENTIALS] bad credentials");
    }
}
