//! 서명 키 생성.

use review_core::{generate_encoded_key, MIN_SIGNING_KEY_LEN};

/// base64 인코딩된 512비트 키를 생성합니다.
///
/// 출력값을 `auth.signing_key` 또는 `REVIEW__AUTH__SIGNING_KEY`에 넣으면 됩니다.
pub fn run_keygen() -> String {
    generate_encoded_key()
}

/// 키 길이 안내 문구.
pub fn key_hint() -> String {
    format!(
        "# {}바이트 HS512 서명 키 (REVIEW__AUTH__SIGNING_KEY)",
        MIN_SIGNING_KEY_LEN
    )
}
