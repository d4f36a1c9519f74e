//! 토큰 발급 및 검증.
//!
//! HS512로 서명한 JWT를 사용합니다. 서명 키는 프로세스 초기화 시 한 번 만들어져
//! [`TokenKeys`]로 변환된 뒤 발급기와 검증기가 `Arc`로 공유합니다.
//!
//! # 클레임
//!
//! | 클레임 | 내용 |
//! |--------|------|
//! | `sub`  | 사용자 이름 |
//! | `iat`  | 발급 시각 (epoch 초) |
//! | `exp`  | 만료 시각 (epoch 초) |
//! | `roles`| 역할 이름을 쉼표로 이어 붙인 문자열 (순서 유지) |

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use review_core::{RoleName, SigningKey};
use serde::{Deserialize, Serialize};

/// 고정 서명 알고리즘.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS512;

/// 역할 클레임 구분자.
const ROLES_DELIMITER: char = ',';

/// 토큰 페이로드 (wire 형식).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    roles: String,
}

/// 검증을 통과한 클레임.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedClaims {
    /// 사용자 이름
    pub subject: String,
    /// 역할 (발급 시 순서 유지)
    pub roles: Vec<RoleName>,
    /// 발급 시각 (epoch 초)
    pub issued_at: i64,
    /// 만료 시각 (epoch 초)
    pub expires_at: i64,
}

/// 토큰 검증 실패.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("잘못된 토큰 형식")]
    Malformed,
    #[error("토큰 서명이 유효하지 않습니다")]
    SignatureInvalid,
    #[error("토큰이 만료되었습니다")]
    Expired,
}

impl TokenError {
    /// 메트릭/로그 라벨.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired => "expired",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::SignatureInvalid
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// 토큰 발급 실패.
#[derive(Debug, thiserror::Error)]
pub enum TokenIssueError {
    #[error("토큰 subject가 비어 있습니다")]
    EmptySubject,
    #[error("토큰에 넣을 역할이 없습니다")]
    EmptyRoles,
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// 서명/검증 키 쌍.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_signing_key(key: &SigningKey) -> Self {
        Self {
            encoding: EncodingKey::from_secret(key.expose_bytes()),
            decoding: DecodingKey::from_secret(key.expose_bytes()),
        }
    }
}

/// 토큰 발급기.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<TokenKeys>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: Arc<TokenKeys>, ttl: Duration) -> Self {
        Self { keys, ttl }
    }

    /// 토큰 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, subject: &str, roles: &[RoleName]) -> Result<String, TokenIssueError> {
        self.issue_at(subject, roles, Utc::now().timestamp())
    }

    /// `issued_at`(epoch 초) 기준으로 토큰 발급.
    ///
    /// # Errors
    /// subject나 역할 목록이 비어 있으면 서명 전에 실패합니다.
    pub fn issue_at(
        &self,
        subject: &str,
        roles: &[RoleName],
        issued_at: i64,
    ) -> Result<String, TokenIssueError> {
        if subject.is_empty() {
            return Err(TokenIssueError::EmptySubject);
        }
        if roles.is_empty() {
            return Err(TokenIssueError::EmptyRoles);
        }

        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
            roles: join_roles(roles),
        };

        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.keys.encoding)?;
        Ok(token)
    }
}

/// 토큰 검증기.
///
/// 내부 상태는 읽기 전용이므로 여러 요청에서 동시에 호출해도 됩니다.
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<TokenKeys>,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // 만료는 `exp <= now` 규칙으로 직접 검사한다
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self { keys, validation }
    }

    /// 현재 시각 기준으로 토큰 검증.
    pub fn validate(&self, token: &str) -> Result<ValidatedClaims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// `now`(epoch 초) 기준으로 토큰 검증.
    ///
    /// 구조 → 서명 → 만료 순서로 확인합니다.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<ValidatedClaims, TokenError> {
        let data = decode::<Claims>(token, &self.keys.decoding, &self.validation)?;
        let claims = data.claims;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(ValidatedClaims {
            subject: claims.sub,
            roles: split_roles(&claims.roles)?,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

fn join_roles(roles: &[RoleName]) -> String {
    roles
        .iter()
        .map(RoleName::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn split_roles(raw: &str) -> Result<Vec<RoleName>, TokenError> {
    raw.split(ROLES_DELIMITER)
        .filter(|segment| !segment.is_empty())
        .map(|segment| RoleName::new(segment).map_err(|_| TokenError::Malformed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TTL: Duration = Duration::from_secs(3600);

    fn keys() -> Arc<TokenKeys> {
        Arc::new(TokenKeys::from_signing_key(&SigningKey::generate()))
    }

    fn pair() -> (TokenIssuer, TokenValidator) {
        let keys = keys();
        (TokenIssuer::new(keys.clone(), TTL), TokenValidator::new(keys))
    }

    fn roles(names: &[&str]) -> Vec<RoleName> {
        names.iter().map(|n| RoleName::new(*n).unwrap()).collect()
    }

    /// 서명 세그먼트의 `index`번째 문자를 다른 base64url 문자로 바꾼다.
    fn flip_signature_char(token: &str, index: usize) -> String {
        let dot = token.rfind('.').unwrap();
        let (head, signature) = token.split_at(dot + 1);
        let mut chars: Vec<char> = signature.chars().collect();
        chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
        format!("{}{}", head, chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_issue_and_validate() {
        let (issuer, validator) = pair();
        let token = issuer.issue("ash", &roles(&["USER", "ADMIN"])).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let claims = validator.validate(&token).unwrap();
        assert_eq!(claims.subject, "ash");
        assert_eq!(claims.roles, roles(&["USER", "ADMIN"]));
        assert_eq!(claims.expires_at - claims.issued_at, 3600);
    }

    #[test]
    fn test_issue_rejects_empty_input() {
        let (issuer, _) = pair();

        assert!(matches!(
            issuer.issue("", &roles(&["USER"])),
            Err(TokenIssueError::EmptySubject)
        ));
        assert!(matches!(
            issuer.issue("ash", &[]),
            Err(TokenIssueError::EmptyRoles)
        ));
    }

    #[test]
    fn test_expired_token() {
        let (issuer, validator) = pair();
        let issued_at = Utc::now().timestamp() - 7200;
        let token = issuer.issue_at("ash", &roles(&["USER"]), issued_at).unwrap();

        assert_eq!(validator.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_boundary() {
        let (issuer, validator) = pair();
        let issued_at = 1_700_000_000;
        let token = issuer.issue_at("ash", &roles(&["USER"]), issued_at).unwrap();
        let exp = issued_at + 3600;

        assert!(validator.validate_at(&token, exp - 1).is_ok());
        assert_eq!(validator.validate_at(&token, exp), Err(TokenError::Expired));
        assert_eq!(validator.validate_at(&token, exp + 1), Err(TokenError::Expired));
    }

    #[test]
    fn test_signature_tamper_every_position() {
        let (issuer, validator) = pair();
        let token = issuer.issue("ash", &roles(&["USER"])).unwrap();
        let signature_len = token.rsplit('.').next().unwrap().len();

        for index in 0..signature_len {
            let tampered = flip_signature_char(&token, index);
            assert_eq!(
                validator.validate(&tampered),
                Err(TokenError::SignatureInvalid),
                "position {}",
                index
            );
        }
    }

    #[test]
    fn test_claims_tamper() {
        let (issuer, validator) = pair();
        let user_token = issuer.issue("ash", &roles(&["USER"])).unwrap();
        let admin_token = issuer.issue("ash", &roles(&["ADMIN"])).unwrap();

        // ADMIN 클레임에 USER 토큰의 서명을 붙인다
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let user_signature = user_token.rsplit('.').next().unwrap();
        let forged = format!("{}.{}.{}", admin_parts[0], admin_parts[1], user_signature);

        assert_eq!(validator.validate(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_other_key_rejected() {
        let (issuer, _) = pair();
        let (_, other_validator) = pair();
        let token = issuer.issue("ash", &roles(&["USER"])).unwrap();

        assert_eq!(
            other_validator.validate(&token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let key = SigningKey::generate();
        let keys = Arc::new(TokenKeys::from_signing_key(&key));
        let validator = TokenValidator::new(keys);

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "ash".to_string(),
            iat: now,
            exp: now + 60,
            roles: "USER".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.expose_bytes()),
        )
        .unwrap();

        assert_eq!(validator.validate(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_malformed_tokens() {
        let (_, validator) = pair();

        for token in ["", "abc", "a.b", "a.b.c", "not a token at all", "...."] {
            assert_eq!(
                validator.validate(token),
                Err(TokenError::Malformed),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_missing_roles_claim_is_malformed() {
        #[derive(Serialize)]
        struct NoRoles {
            sub: String,
            iat: i64,
            exp: i64,
        }

        let key = SigningKey::generate();
        let validator = TokenValidator::new(Arc::new(TokenKeys::from_signing_key(&key)));
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &NoRoles {
                sub: "ash".to_string(),
                iat: now,
                exp: now + 60,
            },
            &EncodingKey::from_secret(key.expose_bytes()),
        )
        .unwrap();

        assert_eq!(validator.validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_split_roles() {
        assert_eq!(split_roles("USER,ADMIN").unwrap(), roles(&["USER", "ADMIN"]));
        assert_eq!(split_roles("USER,,ADMIN,").unwrap(), roles(&["USER", "ADMIN"]));
        assert!(split_roles("").unwrap().is_empty());
        assert_eq!(split_roles("USER, ADMIN"), Err(TokenError::Malformed));
    }

    #[tokio::test]
    async fn test_concurrent_validation() {
        let (issuer, validator) = pair();
        let token = issuer.issue("misty", &roles(&["USER", "GYM_LEADER"])).unwrap();
        let expected = validator.validate(&token).unwrap();

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let validator = validator.clone();
                let token = token.clone();
                tokio::spawn(async move { validator.validate(&token) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip_preserves_subject_and_role_order(
            subject in "[a-zA-Z0-9_.@-]{1,32}",
            names in prop::collection::vec("[A-Z][A-Z_]{0,15}", 1..6),
        ) {
            let (issuer, validator) = pair();
            let roles: Vec<RoleName> = names.iter().map(|n| RoleName::new(n.clone()).unwrap()).collect();

            let token = issuer.issue(&subject, &roles).unwrap();
            let claims = validator.validate(&token).unwrap();

            prop_assert_eq!(claims.subject, subject);
            prop_assert_eq!(claims.roles, roles);
        }
    }
}
