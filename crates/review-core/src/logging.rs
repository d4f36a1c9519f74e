//! tracing 기반 로깅 초기화.
//!
//! 출력 형식:
//! - **pretty**: 개발용
//! - **json**: 로그 수집용
//! - **compact**: 한 줄 형식
//!
//! 토큰, 비밀번호, 비밀번호 해시, 서명 키는 어떤 레벨에서도 기록하지 않습니다.
//! 인증 관련 이벤트는 사용자 이름과 거부 사유만 남깁니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::CoreError;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(CoreError::Config(format!("unknown log format: {}", s))),
        }
    }
}

/// 로깅 시스템 초기화.
///
/// `RUST_LOG`가 설정되어 있으면 `level`보다 우선합니다.
///
/// ```no_run
/// use review_core::{init_logging, LoggingConfig};
///
/// init_logging(&LoggingConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    let format: LogFormat = config.format.parse()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| CoreError::Config(format!("invalid log level {:?}: {}", config.level, e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };
    result.map_err(|e| CoreError::Config(format!("logging already initialized: {}", e)))?;

    tracing::info!(format = ?format, level = %config.level, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_unknown_format_rejected_before_init() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "xml".to_string(),
        };
        assert!(matches!(init_logging(&config), Err(CoreError::Config(_))));
    }
}
