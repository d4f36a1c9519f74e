//! 메모리 자격증명 저장소.
//!
//! 개발과 테스트용입니다. 프로세스가 끝나면 데이터가 사라집니다.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use review_core::{Identity, NewIdentity, RoleName};
use tokio::sync::RwLock;

use super::credentials::{CredentialStore, InsertOutcome, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<String, Identity>,
    roles: BTreeSet<RoleName>,
}

/// `RwLock` 기반 저장소.
///
/// 확인과 삽입을 같은 쓰기 잠금 안에서 수행합니다.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 등록된 사용자 수.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.contains_key(username))
    }

    async fn ensure_role(&self, role: &RoleName) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.roles.contains(role) {
            inner.roles.insert(role.clone());
        }
        Ok(())
    }

    async fn insert_if_absent(&self, identity: NewIdentity) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.contains_key(&identity.username) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        if let Some(missing) = identity.roles.iter().find(|r| !inner.roles.contains(*r)) {
            return Err(StoreError::UnknownRole(missing.clone()));
        }

        let mut roles: Vec<RoleName> = Vec::with_capacity(identity.roles.len());
        for role in &identity.roles {
            if !roles.contains(role) {
                roles.push(role.clone());
            }
        }

        let username = identity.username.clone();
        inner.users.insert(
            username,
            Identity {
                roles,
                ..Identity::from(identity)
            },
        );
        Ok(InsertOutcome::Inserted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
