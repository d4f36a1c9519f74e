//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 래핑되어 여러 요청 간에 공유됩니다.
//! 생성 후에는 변경되지 않으므로 잠금이 필요 없습니다.

use std::sync::Arc;
use std::time::Duration;

use review_core::{AuthConfig, KeySource, RoleName, SigningKey};

use crate::auth::{
    AuthService, AuthorizationPolicy, PolicyError, TokenIssuer, TokenKeys, TokenValidator,
};
use crate::repository::CredentialStore;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 자격증명 저장소
    pub store: Arc<dyn CredentialStore>,

    /// 토큰 발급기 (로그인 전용)
    pub issuer: TokenIssuer,

    /// 토큰 검증기
    pub validator: TokenValidator,

    /// 경로별 접근 규칙
    pub policy: Arc<AuthorizationPolicy>,

    /// 회원가입/로그인
    pub auth: AuthService,

    /// 서명 키 출처
    pub key_source: KeySource,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정과 서명 키로 상태 생성.
    ///
    /// 규칙 패턴이나 기본 역할 이름이 잘못되면 에러를 반환합니다.
    pub fn new(
        config: &AuthConfig,
        signing_key: &SigningKey,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, PolicyError> {
        let policy = AuthorizationPolicy::from_config(config)?;
        let default_role = RoleName::new(config.default_role.as_str())?;

        let keys = Arc::new(TokenKeys::from_signing_key(signing_key));
        let issuer = TokenIssuer::new(keys.clone(), Duration::from_secs(config.token_ttl_secs));
        let validator = TokenValidator::new(keys);
        let auth = AuthService::new(store.clone(), issuer.clone(), default_role);

        Ok(Self {
            store,
            issuer,
            validator,
            policy: Arc::new(policy),
            auth,
            key_source: signing_key.source(),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 자격증명 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.health_check().await.is_ok()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 메모리 저장소, 프로세스 생성 키, 기본 규칙을 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::repository::MemoryCredentialStore;

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    AppState::new(&AuthConfig::default(), &SigningKey::generate(), store)
        .expect("default auth config is valid")
}
