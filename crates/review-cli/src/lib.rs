//! 운영자 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 서명 키 생성
//! - 설정된 키로 토큰 발급
//! - 토큰 검증 및 클레임 확인

pub mod commands;
