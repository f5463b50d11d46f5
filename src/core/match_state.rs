use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::MatchError;
use crate::models::{MatchRecord, MatchStatus};
use crate::services::{MatchStore, StoreError, UserStore};

/// How often `create_or_advance` re-reads a pair after losing a race
const MAX_RESOLVE_ATTEMPTS: usize = 3;

/// Effect of a match request on the pair's record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// A new pending record was created
    Requested,
    /// A reciprocal request accepted a pending record
    Accepted,
    /// The record was left as it was
    AlreadyExists,
}

/// What a match request should do, given the pair's current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Create,
    Accept,
    Keep,
}

/// Pure state machine for a request from `initiator` to `target`
pub fn next_transition(existing: Option<&MatchRecord>, initiator: &str, target: &str) -> Transition {
    match existing {
        None => Transition::Create,
        Some(record)
            if record.status == MatchStatus::Pending
                && record.is_reciprocal_from(initiator, target) =>
        {
            Transition::Accept
        }
        Some(_) => Transition::Keep,
    }
}

/// Pairwise match records and their pending -> accepted lifecycle
#[derive(Clone)]
pub struct MatchStateStore {
    users: Arc<dyn UserStore>,
    matches: Arc<dyn MatchStore>,
}

impl MatchStateStore {
    pub fn new(users: Arc<dyn UserStore>, matches: Arc<dyn MatchStore>) -> Self {
        Self { users, matches }
    }

    /// Record for the pair, whoever initiated it
    pub async fn get_relationship(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Option<MatchRecord>, MatchError> {
        Ok(self.matches.find_by_unordered_pair(user_a, user_b).await?)
    }

    /// Apply a match request from `initiator` to `target`
    ///
    /// Inserts are guarded by the store's pair uniqueness and acceptance by
    /// a compare-and-swap on the status. Losing either race re-reads the
    /// pair and decides again.
    pub async fn create_or_advance(
        &self,
        initiator: &str,
        target: &str,
    ) -> Result<(MatchRecord, MatchOutcome), MatchError> {
        if initiator == target {
            return Err(MatchError::SelfMatch);
        }

        if self.users.get_user(target).await?.is_none() {
            return Err(MatchError::NotFound(format!("target user {}", target)));
        }

        for attempt in 1..=MAX_RESOLVE_ATTEMPTS {
            let existing = self.matches.find_by_unordered_pair(initiator, target).await?;

            match (next_transition(existing.as_ref(), initiator, target), existing) {
                (Transition::Create, _) => {
                    let record = MatchRecord::pending(initiator, target, Utc::now());
                    match self.matches.insert(&record).await {
                        Ok(()) => {
                            tracing::info!("Match request {} -> {} created", initiator, target);
                            return Ok((record, MatchOutcome::Requested));
                        }
                        Err(StoreError::Conflict(reason)) => {
                            tracing::debug!(
                                "Insert for {} -> {} lost a race (attempt {}): {}",
                                initiator, target, attempt, reason
                            );
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                (Transition::Accept, Some(mut record)) => {
                    let now = Utc::now();
                    let swapped = self
                        .matches
                        .update_status(record.id, MatchStatus::Pending, MatchStatus::Accepted, now)
                        .await?;

                    if swapped {
                        record.status = MatchStatus::Accepted;
                        record.updated_at = now;
                        tracing::info!("Match {} <-> {} accepted", initiator, target);
                        return Ok((record, MatchOutcome::Accepted));
                    }

                    tracing::debug!(
                        "Status swap for {} lost a race (attempt {})",
                        record.id, attempt
                    );
                }
                (Transition::Keep, Some(record)) => {
                    return Ok((record, MatchOutcome::AlreadyExists));
                }
                // Accept and Keep are only decided for an existing record
                (_, None) => {}
            }
        }

        Err(MatchError::Conflict(format!(
            "could not resolve match {} -> {} after {} attempts",
            initiator, target, MAX_RESOLVE_ATTEMPTS
        )))
    }
}
