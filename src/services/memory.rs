use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::filters::matches_query_constraints;
use crate::models::{CandidateQuery, MatchRecord, MatchStatus, PairKey, Profile, User};
use crate::services::store::{MatchStore, StoreError, UserStore};

/// In-process store backing both users and match records
///
/// Match records are keyed by [`PairKey`], so the map itself enforces one
/// record per unordered pair.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    matches: RwLock<HashMap<PairKey, MatchRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn query_users(&self, query: &CandidateQuery) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;

        // Sorted by id so repeated queries against the same data agree
        let mut selected: Vec<User> = users
            .values()
            .filter(|user| matches_query_constraints(user, query))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.id.cmp(&b.id));
        selected.truncate(query.limit);

        Ok(selected)
    }

    async fn save_profile(&self, id: &str, profile: &Profile) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(user) => {
                user.profile = Some(profile.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn find_by_unordered_pair(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.matches.read().await.get(&PairKey::new(a, b)).cloned())
    }

    async fn insert(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let key = record.pair_key();
        let mut matches = self.matches.write().await;

        if matches.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "match record already exists for {} / {}",
                key.low, key.high
            )));
        }

        matches.insert(key, record.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: MatchStatus,
        status: MatchStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut matches = self.matches.write().await;

        match matches.values_mut().find(|record| record.id == id) {
            Some(record) if record.status == expected => {
                record.status = status;
                record.updated_at = updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, age: u32, gender: &str) -> User {
        User::new(id, format!("{}@uwaterloo.ca", id))
            .with_profile(Profile::new(id, age, gender).at(43.47, -80.54))
    }

    #[tokio::test]
    async fn test_duplicate_pair_insert_conflicts() {
        let store = InMemoryStore::new();
        let first = MatchRecord::pending("a", "b", Utc::now());
        let reverse = MatchRecord::pending("b", "a", Utc::now());

        store.insert(&first).await.unwrap();
        let err = store.insert(&reverse).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_status_is_compare_and_swap() {
        let store = InMemoryStore::new();
        let record = MatchRecord::pending("a", "b", Utc::now());
        store.insert(&record).await.unwrap();

        let swapped = store
            .update_status(record.id, MatchStatus::Pending, MatchStatus::Accepted, Utc::now())
            .await
            .unwrap();
        assert!(swapped);

        let again = store
            .update_status(record.id, MatchStatus::Pending, MatchStatus::Accepted, Utc::now())
            .await
            .unwrap();
        assert!(!again);

        let stored = store.find_by_unordered_pair("b", "a").await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Accepted);
    }

    #[tokio::test]
    async fn test_query_users_skips_excluded_and_profileless() {
        let store = InMemoryStore::new();
        store.insert_user(user("me", 22, "female")).await;
        store.insert_user(user("other", 23, "female")).await;
        store.insert_user(User::new("blank", "blank@uwaterloo.ca")).await;

        let query = CandidateQuery {
            min_age: 18,
            max_age: 30,
            gender: None,
            exclude_user_id: "me".to_string(),
            limit: 10,
        };
        let found = store.query_users(&query).await.unwrap();

        let ids: Vec<&str> = found.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["other"]);
    }

    #[tokio::test]
    async fn test_save_profile_unknown_user() {
        let store = InMemoryStore::new();
        let saved = store
            .save_profile("ghost", &Profile::new("Ghost", 30, "male"))
            .await
            .unwrap();
        assert!(!saved);
    }
}
