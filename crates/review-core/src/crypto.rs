//! # 서명 키 모듈
//!
//! 토큰 서명에 사용하는 대칭 키(HMAC-SHA512용)를 관리합니다.
//!
//! ## 키 출처
//! - `Generated`: 프로세스 시작 시 OS 난수로 생성. 재시작하면 이전 토큰은 모두 무효가 됩니다.
//! - `Configured`: 설정(`auth.signing_key`)에서 Base64로 로드. 재시작 후에도 토큰이 유지됩니다.
//!
//! 키는 초기화 시 한 번 만들어진 뒤 변경되지 않으며, 읽기 전용으로 공유됩니다.

use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::CoreError;

/// 서명 키 최소 길이 (바이트, 512비트)
pub const MIN_SIGNING_KEY_LEN: usize = 64;

/// 서명 키 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// 프로세스 시작 시 생성
    Generated,
    /// 설정에서 로드
    Configured,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Generated => f.write_str("generated"),
            KeySource::Configured => f.write_str("configured"),
        }
    }
}

/// 토큰 서명 키.
pub struct SigningKey {
    bytes: SecretBox<[u8]>,
    source: KeySource,
}

impl SigningKey {
    /// 새 512비트 키 생성.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_SIGNING_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);

        Self {
            bytes: SecretBox::new(bytes.into_boxed_slice()),
            source: KeySource::Generated,
        }
    }

    /// Base64(표준 알파벳)로 인코딩된 키 로드.
    ///
    /// # Errors
    /// 디코딩에 실패하거나 64바이트보다 짧으면 `CoreError::InvalidSigningKey`를 반환합니다.
    pub fn from_base64(encoded: &str) -> Result<Self, CoreError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| CoreError::InvalidSigningKey(format!("Base64 decode error: {}", e)))?;

        if bytes.len() < MIN_SIGNING_KEY_LEN {
            return Err(CoreError::InvalidSigningKey(format!(
                "expected at least {} bytes, got {}",
                MIN_SIGNING_KEY_LEN,
                bytes.len()
            )));
        }

        Ok(Self {
            bytes: SecretBox::new(bytes.into_boxed_slice()),
            source: KeySource::Configured,
        })
    }

    /// 설정 값에서 키 결정.
    ///
    /// 설정된 키가 있으면 로드하고, 없으면 새로 생성합니다.
    /// 설정된 키가 잘못된 경우 생성 키로 대체하지 않고 에러를 반환합니다.
    pub fn from_setting(configured: Option<&str>) -> Result<Self, CoreError> {
        match configured {
            Some(encoded) => Self::from_base64(encoded),
            None => Ok(Self::generate()),
        }
    }

    /// 키 출처 반환.
    pub fn source(&self) -> KeySource {
        self.source
    }

    /// 원시 키 바이트.
    pub fn expose_bytes(&self) -> &[u8] {
        self.bytes.expose_secret()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// 설정에 넣을 새 서명 키 생성 (Base64)
///
/// # Example
/// ```
/// let key = review_core::crypto::generate_encoded_key();
/// println!("REVIEW__AUTH__SIGNING_KEY={}", key);
/// ```
pub fn generate_encoded_key() -> String {
    let mut key = [0u8; MIN_SIGNING_KEY_LEN];
    OsRng.fill_bytes(&mut key);
    base64::engine::general_purpose::STANDARD.encode(key)
}
