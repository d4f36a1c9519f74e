//! 사용자 식별 정보.
//!
//! 자격증명 저장소가 보관하는 사용자 레코드와 역할 이름을 정의합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 신규 사용자에게 부여되는 기본 역할.
pub const DEFAULT_ROLE: &str = "USER";

/// 역할 이름 최대 길이.
const MAX_ROLE_NAME_LEN: usize = 64;

/// 역할 이름 (예: "USER", "ADMIN").
///
/// 토큰의 `roles` 클레임은 역할 이름을 쉼표로 이어 붙인 문자열이므로,
/// 역할 이름에는 쉼표와 공백이 들어갈 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// 역할 이름 생성.
    ///
    /// 비어 있거나, 쉼표/공백을 포함하거나, 64자를 넘으면 에러를 반환합니다.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= MAX_ROLE_NAME_LEN
            && !name.chars().any(|c| c == ',' || c.is_whitespace());

        if valid {
            Ok(Self(name))
        } else {
            Err(CoreError::InvalidRoleName(name))
        }
    }

    /// 기본 역할 ("USER").
    pub fn default_role() -> Self {
        Self(DEFAULT_ROLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoleName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoleName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(role: RoleName) -> Self {
        role.0
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 등록된 사용자 레코드.
///
/// 사용자 이름은 등록 후 변경되지 않습니다.
/// 역할은 할당된 순서를 유지합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// 고유 사용자 이름
    pub username: String,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    /// 할당된 역할 (할당 순서)
    pub roles: Vec<RoleName>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

/// 신규 사용자 입력.
#[derive(Clone)]
pub struct NewIdentity {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<RoleName>,
}

impl NewIdentity {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<RoleName>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles,
        }
    }
}

impl From<NewIdentity> for Identity {
    fn from(new: NewIdentity) -> Self {
        Self {
            username: new.username,
            password_hash: new.password_hash,
            roles: new.roles,
        }
    }
}

impl fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewIdentity")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_validation() {
        assert!(RoleName::new("USER").is_ok());
        assert!(RoleName::new("ROLE_ADMIN").is_ok());

        assert!(RoleName::new("").is_err());
        assert!(RoleName::new("USER,ADMIN").is_err());
        assert!(RoleName::new("SUPER USER").is_err());
        assert!(RoleName::new("A".repeat(65)).is_err());
    }

    #[test]
    fn test_role_name_is_case_sensitive() {
        let upper = RoleName::new("USER").unwrap();
        let lower = RoleName::new("user").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_default_role() {
        assert_eq!(RoleName::default_role().as_str(), DEFAULT_ROLE);
    }

    #[test]
    fn test_role_name_serialization() {
        let role: RoleName = "ADMIN".parse().unwrap();
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"ADMIN\"");

        let parsed: RoleName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, role);

        let invalid: Result<RoleName, _> = serde_json::from_str("\"A,B\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn test_identity_debug_redacts_hash() {
        let identity = Identity {
            username: "ash".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec![],
        };

        let debug = format!("{:?}", identity);
        assert!(debug.contains("ash"));
        assert!(!debug.contains("secret"));
    }
}
