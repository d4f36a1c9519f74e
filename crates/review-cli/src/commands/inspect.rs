//! 토큰 검증 및 클레임 출력.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use review_api::{TokenKeys, TokenValidator, ValidatedClaims};
use review_core::SigningKey;
use serde::Serialize;

/// 출력 형식.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 검증된 토큰 요약.
#[derive(Debug, Serialize)]
pub struct TokenSummary {
    pub subject: String,
    pub roles: Vec<String>,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<ValidatedClaims> for TokenSummary {
    fn from(claims: ValidatedClaims) -> Self {
        Self {
            subject: claims.subject,
            roles: claims.roles.into_iter().map(String::from).collect(),
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        }
    }
}

fn format_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

impl TokenSummary {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Table => Ok(format!(
                "{:<10} {}\n{:<10} {}\n{:<10} {}\n{:<10} {}",
                "subject",
                self.subject,
                "roles",
                self.roles.join(","),
                "issued",
                format_timestamp(self.issued_at),
                "expires",
                format_timestamp(self.expires_at),
            )),
        }
    }
}

/// 설정된 키로 토큰을 검증합니다.
///
/// 검증 실패 종류(malformed, signature_invalid, expired)를 에러 메시지에 담습니다.
pub fn inspect_token(key: &SigningKey, token: &str) -> Result<TokenSummary> {
    let validator = TokenValidator::new(Arc::new(TokenKeys::from_signing_key(key)));
    let claims = validator
        .validate(token.trim())
        .map_err(|e| anyhow!("token rejected ({}): {}", e.kind(), e))?;

    Ok(claims.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::issue::{issue_token, IssueConfig};
    use review_core::generate_encoded_key;

    fn key() -> SigningKey {
        SigningKey::from_base64(&generate_encoded_key()).unwrap()
    }

    fn token(key: &SigningKey) -> String {
        issue_token(
            key,
            &IssueConfig {
                subject: "misty".into(),
                roles: "USER".into(),
                ttl_secs: 60,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_inspect_valid_token() {
        let key = key();
        let summary = inspect_token(&key, &token(&key)).unwrap();

        assert_eq!(summary.subject, "misty");
        assert_eq!(summary.roles, vec!["USER"]);

        let table = summary.render(OutputFormat::Table).unwrap();
        assert!(table.contains("misty"));

        let json: serde_json::Value =
            serde_json::from_str(&summary.render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["subject"], "misty");
    }

    #[test]
    fn test_inspect_with_other_key_fails() {
        let err = inspect_token(&key(), &token(&key())).unwrap_err();
        assert!(err.to_string().contains("signature_invalid"));
    }

    #[test]
    fn test_output_format_parse() {
        assert!(matches!(OutputFormat::parse("JSON"), Ok(OutputFormat::Json)));
        assert!(OutputFormat::parse("csv").is_err());
    }
}
