//! 토큰 발급.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use review_api::{TokenIssuer, TokenKeys};
use review_core::{RoleName, SigningKey};

/// 토큰 발급 설정.
#[derive(Debug)]
pub struct IssueConfig {
    /// 토큰 subject (사용자 이름)
    pub subject: String,
    /// 쉼표로 구분된 역할 목록 (예: "USER,ADMIN")
    pub roles: String,
    /// 유효 기간 (초)
    pub ttl_secs: u64,
}

/// 쉼표로 구분된 역할 목록 파싱. 빈 항목은 무시합니다.
pub fn parse_roles(roles: &str) -> Result<Vec<RoleName>> {
    roles
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| RoleName::new(r).with_context(|| format!("invalid role: {:?}", r)))
        .collect()
}

/// 설정된 키로 토큰을 서명합니다.
pub fn issue_token(key: &SigningKey, config: &IssueConfig) -> Result<String> {
    if config.ttl_secs == 0 {
        bail!("--ttl-secs must be positive");
    }
    let roles = parse_roles(&config.roles)?;
    let issuer = TokenIssuer::new(
        Arc::new(TokenKeys::from_signing_key(key)),
        Duration::from_secs(config.ttl_secs),
    );

    issuer
        .issue(&config.subject, &roles)
        .context("failed to issue token")
}
