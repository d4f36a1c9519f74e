//! CLI 명령어 구현 모듈.

pub mod inspect;
pub mod issue;
pub mod keygen;

use anyhow::{bail, Result};
use review_core::{KeySource, SigningKey};

/// 명령 인자 또는 설정에서 서명 키를 로드합니다.
///
/// 프로세스마다 새로 생성한 키는 서버와 공유되지 않으므로 거부합니다.
pub fn configured_key(explicit: Option<&str>, configured: Option<&str>) -> Result<SigningKey> {
    let key = SigningKey::from_setting(explicit.or(configured))?;
    if key.source() == KeySource::Generated {
        bail!(
            "no signing key configured: pass --key or set REVIEW__AUTH__SIGNING_KEY \
             (generate one with `review keygen`)"
        );
    }
    Ok(key)
}
