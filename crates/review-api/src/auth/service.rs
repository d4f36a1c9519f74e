//! 회원가입과 로그인.
//!
//! 자격증명 저장소를 변경하고 토큰 발급기를 호출하는 유일한 경로입니다.

use std::sync::Arc;

use review_core::{NewIdentity, RoleName};
use tracing::{debug, error, info};

use super::entry_point::AuthError;
use super::password::{hash_password_blocking, verify_password_blocking, PasswordError};
use super::token::TokenIssuer;
use crate::metrics::{record_login, record_registration};
use crate::repository::{CredentialStore, InsertOutcome};

/// 로그인 결과.
#[derive(Debug, Clone)]
pub struct LoginToken {
    /// 서명된 토큰
    pub token: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: u64,
}

/// 회원가입/로그인 서비스.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    default_role: RoleName,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, issuer: TokenIssuer, default_role: RoleName) -> Self {
        Self {
            store,
            issuer,
            default_role,
        }
    }

    pub fn default_role(&self) -> &RoleName {
        &self.default_role
    }

    /// 신규 사용자 등록.
    ///
    /// 기본 역할이 없으면 먼저 만든 뒤 새 사용자에게 할당합니다.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let result = self.try_register(username, password).await;
        record_registration(match &result {
            Ok(()) => "success",
            Err(AuthError::UsernameTaken) => "taken",
            Err(_) => "error",
        });
        result
    }

    async fn try_register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.store.exists_by_username(username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password_blocking(password.to_string())
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing: {}", e)))?;

        self.store.ensure_role(&self.default_role).await?;

        let identity = NewIdentity::new(username, password_hash, vec![self.default_role.clone()]);
        match self.store.insert_if_absent(identity).await? {
            InsertOutcome::Inserted => {
                info!(username = %username, "User registered");
                Ok(())
            }
            // 존재 확인 후 다른 요청이 먼저 삽입한 경우
            InsertOutcome::AlreadyExists => Err(AuthError::UsernameTaken),
        }
    }

    /// 자격증명 확인 후 토큰 발급.
    ///
    /// 사용자 없음과 비밀번호 불일치는 모두 `InvalidCredentials`입니다.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginToken, AuthError> {
        let result = self.try_login(username, password).await;
        record_login(if result.is_ok() { "success" } else { "failure" });
        result
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<LoginToken, AuthError> {
        let identity = self.store.find_by_username(username).await?;
        let stored_hash = identity.as_ref().map(|i| i.password_hash.clone());

        match verify_password_blocking(password.to_string(), stored_hash).await {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                debug!(
                    username = %username,
                    user_exists = identity.is_some(),
                    "Login rejected"
                );
                return Err(AuthError::InvalidCredentials);
            }
            Err(PasswordError::InvalidHashFormat) => {
                error!(username = %username, "Stored password hash is unreadable");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::Internal(format!("password verification: {}", e))),
        }

        let Some(identity) = identity else {
            return Err(AuthError::InvalidCredentials);
        };

        let token = self
            .issuer
            .issue(&identity.username, &identity.roles)
            .map_err(|e| AuthError::Internal(format!("token issue: {}", e)))?;

        info!(username = %identity.username, "User logged in");

        Ok(LoginToken {
            token,
            expires_in: self.issuer.ttl().as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{TokenKeys, TokenValidator};
    use crate::repository::MemoryCredentialStore;
    use review_core::{Identity, SigningKey};
    use std::time::Duration;

    fn service() -> (AuthService, TokenValidator, Arc<MemoryCredentialStore>) {
        let keys = Arc::new(TokenKeys::from_signing_key(&SigningKey::generate()));
        let store = Arc::new(MemoryCredentialStore::new());
        let service = AuthService::new(
            store.clone(),
            TokenIssuer::new(keys.clone(), Duration::from_secs(3600)),
            RoleName::default_role(),
        );
        (service, TokenValidator::new(keys), store)
    }

    #[tokio::test]
    async fn test_register_assigns_default_role() {
        let (service, _, store) = service();

        service.register("ash", "Pikachu025!").await.unwrap();

        let identity: Identity = store.find_by_username("ash").await.unwrap().unwrap();
        assert_eq!(identity.roles, vec![RoleName::default_role()]);
        assert!(identity.password_hash.starts_with("$argon2id$"));
        assert_ne!(identity.password_hash, "Pikachu025!");
    }

    #[tokio::test]
    async fn test_register_twice_is_taken() {
        let (service, _, store) = service();

        service.register("ash", "Pikachu025!").await.unwrap();
        let second = service.register("ash", "Charizard006!").await;

        assert!(matches!(second, Err(AuthError::UsernameTaken)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_login_issues_token_with_roles() {
        let (service, validator, _) = service();
        service.register("ash", "Pikachu025!").await.unwrap();

        let login = service.login("ash", "Pikachu025!").await.unwrap();
        assert_eq!(login.expires_in, 3600);

        let claims = validator.validate(&login.token).unwrap();
        assert_eq!(claims.subject, "ash");
        assert_eq!(claims.roles, vec![RoleName::default_role()]);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _, _) = service();
        service.register("ash", "Pikachu025!").await.unwrap();

        let wrong_password = service.login("ash", "Raichu026!").await.unwrap_err();
        let unknown_user = service.login("gary", "Pikachu025!").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.status(), unknown_user.status());
    }

    #[tokio::test]
    async fn test_login_with_corrupt_hash_is_invalid_credentials() {
        let (service, _, store) = service();
        let role = RoleName::default_role();
        store.ensure_role(&role).await.unwrap();
        store
            .insert_if_absent(NewIdentity::new("misty", "not-a-phc-string", vec![role]))
            .await
            .unwrap();

        let result = service.login("misty", "Starmie121!").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let (service, _, store) = service();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.register("brock", "Onix095!").await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(AuthError::UsernameTaken) => {}
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.user_count().await, 1);
    }
}
