//! # Review Core
//!
//! 리뷰 API 인증 계층의 핵심 타입과 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 서버와 CLI가 함께 사용하는 기본 요소를 담고 있습니다:
//! - 사용자 식별 정보 및 역할 이름 타입
//! - 토큰 서명 키 (프로세스 생성 또는 설정 로드)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod logging;

pub use config::*;
pub use crypto::{generate_encoded_key, KeySource, SigningKey, MIN_SIGNING_KEY_LEN};
pub use error::*;
pub use identity::{Identity, NewIdentity, RoleName, DEFAULT_ROLE};
pub use logging::*;
