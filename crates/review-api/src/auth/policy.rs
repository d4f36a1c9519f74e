//! 라우트 접근 정책.
//!
//! 경로 패턴과 요구 조건의 순서 있는 목록입니다. 선언 순서대로 평가하며
//! 처음 일치한 규칙이 결정합니다. 일치하는 규칙이 없으면 인증만 요구합니다.
//!
//! # 패턴 문법
//!
//! - 리터럴 세그먼트: `/api/auth`
//! - `*`: 정확히 한 세그먼트
//! - `**`: 0개 이상의 세그먼트
//!
//! 끝의 `/`와 빈 세그먼트는 무시합니다.

use review_core::{AuthConfig, RoleName, RuleAccess};

use super::RequestIdentity;

/// 정책 구성 에러.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("잘못된 경로 패턴 {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },
    #[error("규칙 {0:?}에 역할이 없습니다")]
    MissingRole(String),
    #[error(transparent)]
    InvalidRole(#[from] review_core::CoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Any,
}

/// Ant 스타일 경로 패턴.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, PolicyError> {
        let invalid = |reason| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "**" => Ok(Segment::Any),
                "*" => Ok(Segment::Single),
                s if s.contains('*') => Err(invalid("'*' must be a whole segment")),
                s => Ok(Segment::Literal(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &path)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Any, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Single, rest)) => !path.is_empty() && match_segments(rest, &path[1..]),
        Some((Segment::Literal(literal), rest)) => {
            path.first().is_some_and(|segment| segment == literal)
                && match_segments(rest, &path[1..])
        }
    }
}

/// 라우트 접근 요구 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequirement {
    /// 신원 없이 접근 가능
    OpenAccess,
    /// 유효한 신원 필요 (역할 무관)
    RequiresAuthentication,
    /// 특정 역할 필요
    RequiresRole(RoleName),
}

static FALLBACK_REQUIREMENT: AccessRequirement = AccessRequirement::RequiresAuthentication;

/// 접근 규칙.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: RoutePattern,
    pub requirement: AccessRequirement,
}

impl AccessRule {
    pub fn new(pattern: &str, requirement: AccessRequirement) -> Result<Self, PolicyError> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            requirement,
        })
    }
}

/// 접근 거부 사유.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// 신원이 없음
    MissingIdentity,
    /// 신원은 있지만 필요한 역할이 없음
    InsufficientRole { required: RoleName },
}

impl Denial {
    /// 메트릭/로그 라벨.
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::MissingIdentity => "missing_identity",
            Denial::InsufficientRole { .. } => "insufficient_role",
        }
    }
}

/// 순서 있는 접근 규칙 목록.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<AccessRule>,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// 기본 규칙.
    ///
    /// | 패턴 | 요구 조건 |
    /// |------|-----------|
    /// | `/api/auth/**` | 공개 |
    /// | `/health/**` | 공개 |
    /// | `/metrics` | 공개 |
    /// | `/swagger-ui/**` | 공개 |
    /// | `/api-docs/**` | 공개 |
    /// | `/api/pokemon/**` | 신규 사용자 기본 역할 |
    /// | 그 외 | 인증 |
    pub fn default_rules(default_role: &RoleName) -> Result<Self, PolicyError> {
        Ok(Self::new(vec![
            AccessRule::new("/api/auth/**", AccessRequirement::OpenAccess)?,
            AccessRule::new("/health/**", AccessRequirement::OpenAccess)?,
            AccessRule::new("/metrics", AccessRequirement::OpenAccess)?,
            AccessRule::new("/swagger-ui/**", AccessRequirement::OpenAccess)?,
            AccessRule::new("/api-docs/**", AccessRequirement::OpenAccess)?,
            AccessRule::new(
                "/api/pokemon/**",
                AccessRequirement::RequiresRole(default_role.clone()),
            )?,
        ]))
    }

    /// 설정에서 정책 생성. 규칙이 비어 있으면 기본 규칙을 사용합니다.
    pub fn from_config(config: &AuthConfig) -> Result<Self, PolicyError> {
        if config.rules.is_empty() {
            let default_role = RoleName::new(config.default_role.clone())?;
            return Self::default_rules(&default_role);
        }

        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let requirement = match rule.access {
                    RuleAccess::Open => AccessRequirement::OpenAccess,
                    RuleAccess::Authenticated => AccessRequirement::RequiresAuthentication,
                    RuleAccess::Role => {
                        let role = rule
                            .role
                            .clone()
                            .ok_or_else(|| PolicyError::MissingRole(rule.pattern.clone()))?;
                        AccessRequirement::RequiresRole(RoleName::new(role)?)
                    }
                };
                AccessRule::new(&rule.pattern, requirement)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// 경로에 적용되는 요구 조건 (첫 번째 일치 규칙).
    pub fn requirement_for(&self, path: &str) -> &AccessRequirement {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| &rule.requirement)
            .unwrap_or(&FALLBACK_REQUIREMENT)
    }

    /// 요청 허용 여부 판단.
    pub fn evaluate(&self, path: &str, identity: Option<&RequestIdentity>) -> Result<(), Denial> {
        match (self.requirement_for(path), identity) {
            (AccessRequirement::OpenAccess, _) => Ok(()),
            (_, None) => Err(Denial::MissingIdentity),
            (AccessRequirement::RequiresAuthentication, Some(_)) => Ok(()),
            (AccessRequirement::RequiresRole(role), Some(identity)) => {
                if identity.has_role(role.as_str()) {
                    Ok(())
                } else {
                    Err(Denial::InsufficientRole {
                        required: role.clone(),
                    })
                }
            }
        }
    }
}
