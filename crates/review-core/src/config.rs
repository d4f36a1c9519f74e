//! 설정 관리.
//!
//! 기본값, TOML 파일, 환경 변수(`REVIEW__` 접두사) 순서로 설정을 합성합니다.
//!
//! ```text
//! REVIEW__SERVER__PORT=9000
//! REVIEW__AUTH__TOKEN_TTL_SECS=600
//! REVIEW__AUTH__SIGNING_KEY=<base64, 64바이트 이상>
//! REVIEW__DATABASE__URL=postgres://...
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::CoreError;
use crate::identity::{RoleName, DEFAULT_ROLE};

/// 설정 파일 경로 환경 변수
pub const CONFIG_PATH_ENV: &str = "REVIEW_CONFIG";

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin 목록 (비어 있으면 모두 허용)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 연결 URL (없으면 메모리 저장소 사용)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// 인증 설정.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 토큰 유효 기간 (초)
    pub token_ttl_secs: u64,
    /// Base64 서명 키. 없으면 프로세스 시작 시 생성
    pub signing_key: Option<String>,
    /// 신규 사용자 기본 역할
    pub default_role: String,
    /// 라우트 접근 규칙 (선언 순서대로 평가, 비어 있으면 기본 규칙)
    pub rules: Vec<RuleConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 3600,
            signing_key: None,
            default_role: DEFAULT_ROLE.to_string(),
            rules: Vec::new(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_role", &self.default_role)
            .field("rules", &self.rules)
            .finish()
    }
}

/// 라우트 접근 규칙 설정.
///
/// ```toml
/// [[auth.rules]]
/// pattern = "/api/auth/**"
/// access = "open"
///
/// [[auth.rules]]
/// pattern = "/api/pokemon/**"
/// access = "role"
/// role = "USER"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleConfig {
    /// Ant 스타일 경로 패턴
    pub pattern: String,
    /// 접근 방식
    pub access: RuleAccess,
    /// `access = "role"`일 때 필요한 역할
    #[serde(default)]
    pub role: Option<String>,
}

/// 규칙 접근 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAccess {
    /// 인증 없이 접근
    Open,
    /// 유효한 신원 필요
    Authenticated,
    /// 특정 역할 필요
    Role,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("REVIEW")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `REVIEW_CONFIG` 또는 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, CoreError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.auth.token_ttl_secs == 0 {
            return Err(CoreError::Config(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }

        RoleName::new(self.auth.default_role.clone())?;

        for rule in &self.auth.rules {
            match (rule.access, &rule.role) {
                (RuleAccess::Role, None) => {
                    return Err(CoreError::Config(format!(
                        "rule {:?} requires a role",
                        rule.pattern
                    )));
                }
                (RuleAccess::Role, Some(role)) => {
                    RoleName::new(role.clone())?;
                }
                (_, Some(_)) => {
                    return Err(CoreError::Config(format!(
                        "rule {:?} sets a role but access is not \"role\"",
                        rule.pattern
                    )));
                }
                (_, None) => {}
            }
        }

        if self.server.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<AppConfig, CoreError> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.default_role, "USER");
        assert!(config.auth.signing_key.is_none());
        assert!(config.auth.rules.is_empty());
        assert!(config.database.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = from_toml(
            r#"
            [auth]
            token_ttl_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.token_ttl_secs, 600);
        assert_eq!(config.auth.default_role, "USER");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_rules_from_file() {
        let config = from_toml(
            r#"
            [[auth.rules]]
            pattern = "/api/auth/**"
            access = "open"

            [[auth.rules]]
            pattern = "/api/pokemon/**"
            access = "role"
            role = "USER"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.rules.len(), 2);
        assert_eq!(config.auth.rules[0].access, RuleAccess::Open);
        assert_eq!(config.auth.rules[1].role.as_deref(), Some("USER"));
    }

    #[test]
    fn test_role_rule_without_role_rejected() {
        let result = from_toml(
            r#"
            [[auth.rules]]
            pattern = "/api/admin/**"
            access = "role"
            "#,
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = from_toml(
            r#"
            [auth]
            token_ttl_secs = 0
            "#,
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_invalid_default_role_rejected() {
        let result = from_toml(
            r#"
            [auth]
            default_role = "USER,ADMIN"
            "#,
        );
        assert!(matches!(result, Err(CoreError::InvalidRoleName(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.auth.signing_key = Some("c2VjcmV0LWtleQ==".to_string());
        config.database.url = Some("postgres://user:pw@localhost/review".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("c2VjcmV0LWtleQ=="));
        assert!(!debug.contains("pw@localhost"));
    }

    #[test]
    fn test_bind_address() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_address(), "127.0.0.1:8080");
    }
}
