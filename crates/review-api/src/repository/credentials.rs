//! 자격증명 저장소 계약.
//!
//! 사용자 레코드(사용자 이름, 비밀번호 해시, 역할)를 보관합니다.
//! 사용자 이름 고유성은 저장소가 보장하며, 인증 계층은 잠금을 두지 않습니다.

use async_trait::async_trait;
use review_core::{Identity, NewIdentity, RoleName};

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),

    #[error("마이그레이션 실패: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("등록되지 않은 역할: {0}")]
    UnknownRole(RoleName),

    #[error("저장된 데이터가 손상되었습니다: {0}")]
    Corrupt(String),
}

/// `insert_if_absent` 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// 자격증명 저장소.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자 조회. 역할은 할당 순서로 반환합니다.
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;

    /// 역할 레코드가 없으면 생성 (멱등).
    async fn ensure_role(&self, role: &RoleName) -> Result<(), StoreError>;

    /// 사용자 이름이 없을 때만 원자적으로 삽입.
    ///
    /// 모든 역할은 [`ensure_role`](Self::ensure_role)로 먼저 만들어져 있어야 합니다.
    async fn insert_if_absent(&self, identity: NewIdentity) -> Result<InsertOutcome, StoreError>;

    /// 저장소 연결 확인.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// 저장소 종류 ("memory", "postgres").
    fn backend(&self) -> &'static str;
}
