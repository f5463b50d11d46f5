use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CandidateQuery, MatchRecord, MatchStatus, Profile, User};

/// Errors raised by store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    /// A record for the same unordered pair already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Read/write access to users and their profiles
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Users with a profile matching the hard filters of `query`
    ///
    /// Never returns `query.exclude_user_id`. At most `query.limit` rows,
    /// in no particular order.
    async fn query_users(&self, query: &CandidateQuery) -> Result<Vec<User>, StoreError>;

    /// Insert or replace the profile of an existing user
    ///
    /// Returns false if the user does not exist.
    async fn save_profile(&self, id: &str, profile: &Profile) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Persistence for pairwise match records
///
/// Implementations must reject a second record for the same unordered
/// pair with [`StoreError::Conflict`].
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn find_by_unordered_pair(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<MatchRecord>, StoreError>;

    async fn insert(&self, record: &MatchRecord) -> Result<(), StoreError>;

    /// Compare-and-swap the status of record `id`
    ///
    /// Returns false when the record is missing or its status is no longer
    /// `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: MatchStatus,
        status: MatchStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
