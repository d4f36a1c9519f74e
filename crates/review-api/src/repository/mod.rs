//! 자격증명 저장소.
//!
//! 저장소 계약([`CredentialStore`])과 두 구현을 제공합니다:
//! - [`MemoryCredentialStore`]: 개발/테스트용
//! - [`PgCredentialStore`]: PostgreSQL

pub mod credentials;
pub mod memory;
pub mod postgres;

pub use credentials::{CredentialStore, InsertOutcome, StoreError};
pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;
