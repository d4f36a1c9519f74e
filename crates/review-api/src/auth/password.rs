//! 비밀번호 해싱.
//!
//! Argon2id 기반 단방향 해싱 및 검증. 해시는 솔트를 포함한 PHC 문자열입니다.
//! 해싱은 CPU를 오래 점유하므로 비동기 코드에서는 [`hash_password_blocking`]과
//! [`verify_password_blocking`]을 사용합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호가 일치하지 않습니다")]
    Mismatch,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
    #[error("해싱 작업이 중단되었습니다")]
    TaskFailed,
}

/// 존재하지 않는 사용자 로그인 시 검증에 쓰는 해시.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("dummy-password-for-timing").ok());

/// 비밀번호 해싱.
///
/// ```rust,ignore
/// let hash = hash_password("pikachu")?;
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// 저장된 해시와 비밀번호 비교.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

/// 더미 해시에 대해 검증을 수행하고 결과는 버립니다.
///
/// 사용자가 없을 때도 해시 검증 한 번만큼의 시간이 걸리게 합니다.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

/// blocking 풀에서 해싱.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| PasswordError::TaskFailed)?
}

/// blocking 풀에서 검증. `hash`가 없으면 더미 해시로 검증하고 `Mismatch`를 반환합니다.
pub async fn verify_password_blocking(
    password: String,
    hash: Option<String>,
) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            verify_dummy(&password);
            Err(PasswordError::Mismatch)
        }
    })
    .await
    .map_err(|_| PasswordError::TaskFailed)?
}
