//! 핵심 에러 타입.
//!
//! 설정 로드, 서명 키 처리, 역할 이름 검증에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 값 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 설정 소스 로드 에러 (파일, 환경 변수)
    #[error("설정 로드 실패: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// 서명 키 에러
    #[error("잘못된 서명 키: {0}")]
    InvalidSigningKey(String),

    /// 역할 이름 에러
    #[error("잘못된 역할 이름: {0:?}")]
    InvalidRoleName(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
