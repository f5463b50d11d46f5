use std::sync::Arc;

use crate::core::MatchError;
use crate::models::{CandidateQuery, User};
use crate::services::UserStore;

/// Hard filters for candidate selection
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCriteria {
    pub min_age: u32,
    pub max_age: u32,
    pub gender: Option<String>,
    pub limit: usize,
}

impl CandidateCriteria {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new(min_age: u32, max_age: u32) -> Self {
        Self {
            min_age,
            max_age,
            gender: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Check `min_age <= max_age` and a positive limit
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.min_age > self.max_age {
            return Err(MatchError::InvalidInput(format!(
                "min_age {} exceeds max_age {}",
                self.min_age, self.max_age
            )));
        }
        if self.limit == 0 {
            return Err(MatchError::InvalidInput("limit must be positive".to_string()));
        }
        Ok(())
    }

    /// Store query for `requester_id`; a blank gender means no gender filter
    pub fn to_query(&self, requester_id: &str) -> CandidateQuery {
        CandidateQuery {
            min_age: self.min_age,
            max_age: self.max_age,
            gender: self
                .gender
                .as_ref()
                .filter(|gender| !gender.is_empty())
                .cloned(),
            exclude_user_id: requester_id.to_string(),
            limit: self.limit,
        }
    }
}

/// Check if a user satisfies the hard filters of a candidate query
///
/// Users without a profile never match. Location is not considered here.
#[inline]
pub fn matches_query_constraints(user: &User, query: &CandidateQuery) -> bool {
    if user.id == query.exclude_user_id {
        return false;
    }

    let profile = match &user.profile {
        Some(profile) => profile,
        None => return false,
    };

    if profile.age < query.min_age || profile.age > query.max_age {
        return false;
    }

    if let Some(gender) = &query.gender {
        if &profile.gender != gender {
            return false;
        }
    }

    true
}

/// Selects candidate users from the user store
///
/// This is a capped, unordered selection: no distance filtering and no
/// sorting happen here.
#[derive(Clone)]
pub struct CandidateFilter {
    users: Arc<dyn UserStore>,
}

impl CandidateFilter {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Load a user that has a profile, or fail with `NotFound`
    pub async fn load_requester(&self, requester_id: &str) -> Result<User, MatchError> {
        match self.users.get_user(requester_id).await? {
            Some(user) if user.profile.is_some() => Ok(user),
            _ => Err(MatchError::NotFound(format!(
                "profile for user {}",
                requester_id
            ))),
        }
    }

    /// Candidates for `requester_id` matching the age/gender filters
    ///
    /// Fails with `NotFound` if the requester has no stored profile.
    pub async fn find_candidates(
        &self,
        requester_id: &str,
        criteria: &CandidateCriteria,
    ) -> Result<Vec<User>, MatchError> {
        let requester = self.load_requester(requester_id).await?;
        self.select(&requester.id, criteria).await
    }

    /// Candidate selection for an already loaded requester
    pub async fn select(
        &self,
        requester_id: &str,
        criteria: &CandidateCriteria,
    ) -> Result<Vec<User>, MatchError> {
        criteria.validate()?;

        let query = criteria.to_query(requester_id);
        let mut candidates: Vec<User> = self
            .users
            .query_users(&query)
            .await?
            .into_iter()
            .filter(|user| matches_query_constraints(user, &query))
            .collect();
        candidates.truncate(query.limit);

        tracing::debug!(
            "Selected {} candidates for {} (age {}-{}, gender {:?})",
            candidates.len(),
            requester_id,
            query.min_age,
            query.max_age,
            query.gender
        );

        Ok(candidates)
    }
}
