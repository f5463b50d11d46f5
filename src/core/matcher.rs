use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::{
    distance::{distance_between, round_km, validate_coordinates},
    filters::{CandidateCriteria, CandidateFilter},
    match_state::{MatchOutcome, MatchStateStore},
    MatchError,
};
use crate::models::{
    GeoPoint, MatchCandidate, MatchStatus, MatchingConfig, PotentialMatchesQuery, User,
};
use crate::services::{MatchStore, UserStore};

/// Resolved discovery filters
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFilters {
    pub max_distance_km: f64,
    pub criteria: CandidateCriteria,
}

impl MatchFilters {
    /// Fill unset query fields from `config` and validate the result
    ///
    /// The limit is capped at `config.max_limit`.
    pub fn resolve(query: &PotentialMatchesQuery, config: &MatchingConfig) -> Result<Self, MatchError> {
        let max_distance_km = query.max_distance.unwrap_or(config.max_distance_km);
        if !max_distance_km.is_finite() || max_distance_km <= 0.0 {
            return Err(MatchError::InvalidInput(format!(
                "max_distance must be positive, got {}",
                max_distance_km
            )));
        }

        let criteria = CandidateCriteria {
            min_age: query.min_age.unwrap_or(config.default_min_age),
            max_age: query.max_age.unwrap_or(config.default_max_age),
            gender: query.gender.clone(),
            limit: query.limit.unwrap_or(config.default_limit).min(config.max_limit),
        };
        criteria.validate()?;

        Ok(Self { max_distance_km, criteria })
    }
}

/// Ranked discovery result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialMatches {
    pub matches: Vec<MatchCandidate>,
    pub count: usize,
}

/// Result of a match request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub status: MatchStatus,
    /// True only when this call created the record
    pub created: bool,
    pub outcome: MatchOutcome,
}

impl MatchResult {
    pub fn message(&self) -> String {
        match self.outcome {
            MatchOutcome::Requested => "Match request sent".to_string(),
            MatchOutcome::Accepted => "Match accepted!".to_string(),
            MatchOutcome::AlreadyExists => {
                format!("Match already exists with status: {}", self.status)
            }
        }
    }
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Requester lookup and origin resolution
/// 2. Hard filters (age, gender, not-self) via [`CandidateFilter`]
/// 3. Distance filter on candidates with a location
/// 4. Relationship status lookup
/// 5. Distance sort
#[derive(Clone)]
pub struct MatchOrchestrator {
    candidates: CandidateFilter,
    states: MatchStateStore,
    config: MatchingConfig,
}

impl MatchOrchestrator {
    pub fn new(users: Arc<dyn UserStore>, matches: Arc<dyn MatchStore>, config: MatchingConfig) -> Self {
        Self {
            candidates: CandidateFilter::new(users.clone()),
            states: MatchStateStore::new(users, matches),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn candidate_filter(&self) -> &CandidateFilter {
        &self.candidates
    }

    pub fn match_states(&self) -> &MatchStateStore {
        &self.states
    }

    /// Nearby candidates for `requester_id`, closest first
    pub async fn list_potential_matches(
        &self,
        requester_id: &str,
        filters: &MatchFilters,
    ) -> Result<PotentialMatches, MatchError> {
        let requester = self.candidates.load_requester(requester_id).await?;
        let origin = self.origin_for(&requester)?;

        let candidates = self.candidates.select(&requester.id, &filters.criteria).await?;
        let total_candidates = candidates.len();

        let mut ranked: Vec<(f64, User)> = candidates
            .into_iter()
            .filter_map(|user| {
                let location = user.profile.as_ref()?.location()?;
                if let Err(e) = validate_coordinates(location.latitude, location.longitude) {
                    tracing::warn!("Skipping candidate {} with bad location: {}", user.id, e);
                    return None;
                }
                let distance_km = distance_between(origin, location);
                (distance_km <= filters.max_distance_km).then_some((distance_km, user))
            })
            .collect();

        // Sort by distance (ascending), ties by user id
        ranked.sort_by(|(da, a), (db, b)| {
            da.partial_cmp(db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut matches = Vec::with_capacity(ranked.len());
        for (distance_km, user) in ranked {
            let match_status = self
                .states
                .get_relationship(&requester.id, &user.id)
                .await?
                .map(|record| record.status);

            if let Some(candidate) = to_candidate(user, distance_km, match_status) {
                matches.push(candidate);
            }
        }

        tracing::info!(
            "Returning {} matches for user {} (from {} candidates within age/gender filters)",
            matches.len(),
            requester.id,
            total_candidates
        );

        Ok(PotentialMatches {
            count: matches.len(),
            matches,
        })
    }

    /// Send or accept a match request from `requester_id` to `target_id`
    pub async fn request_match(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> Result<MatchResult, MatchError> {
        let (record, outcome) = self.states.create_or_advance(requester_id, target_id).await?;

        Ok(MatchResult {
            status: record.status,
            created: outcome == MatchOutcome::Requested,
            outcome,
        })
    }

    /// Requester's own location, else the configured fallback
    fn origin_for(&self, requester: &User) -> Result<GeoPoint, MatchError> {
        if let Some(location) = requester.profile.as_ref().and_then(|p| p.location()) {
            return Ok(location);
        }

        match self.config.fallback_location {
            Some(fallback) => {
                tracing::debug!("User {} has no location, using fallback origin", requester.id);
                Ok(fallback)
            }
            None => Err(MatchError::InvalidInput(format!(
                "user {} has no location set",
                requester.id
            ))),
        }
    }
}

fn to_candidate(user: User, distance_km: f64, match_status: Option<MatchStatus>) -> Option<MatchCandidate> {
    let profile = user.profile?;

    Some(MatchCandidate {
        user_id: user.id,
        name: profile.name,
        age: profile.age,
        gender: profile.gender,
        bio: profile.bio,
        program: profile.program,
        graduation_year: profile.graduation_year,
        photos: profile.photos,
        distance_km: round_km(distance_km),
        match_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use crate::services::InMemoryStore;

    // Waterloo campus
    const ORIGIN: (f64, f64) = (43.4723, -80.5449);

    fn create_candidate(id: &str, age: u32, gender: &str, lat: f64, lon: f64) -> User {
        User::new(id, format!("{}@uwaterloo.ca", id))
            .with_profile(Profile::new(format!("User {}", id), age, gender).at(lat, lon))
    }

    async fn setup(users: Vec<User>, config: MatchingConfig) -> (Arc<InMemoryStore>, MatchOrchestrator) {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_user(create_candidate("me", 22, "male", ORIGIN.0, ORIGIN.1))
            .await;
        for user in users {
            store.insert_user(user).await;
        }
        let orchestrator = MatchOrchestrator::new(store.clone(), store.clone(), config);
        (store, orchestrator)
    }

    fn default_filters() -> MatchFilters {
        MatchFilters::resolve(&PotentialMatchesQuery::default(), &MatchingConfig::default()).unwrap()
    }

    #[test]
    fn test_filters_resolve_defaults() {
        let filters = default_filters();
        assert_eq!(filters.max_distance_km, 50.0);
        assert_eq!(filters.criteria.min_age, 18);
        assert_eq!(filters.criteria.max_age, 100);
        assert_eq!(filters.criteria.limit, 20);
    }

    #[test]
    fn test_filters_cap_limit() {
        let query = PotentialMatchesQuery { limit: Some(500), ..Default::default() };
        let filters = MatchFilters::resolve(&query, &MatchingConfig::default()).unwrap();
        assert_eq!(filters.criteria.limit, 100);
    }

    #[test]
    fn test_filters_reject_bad_input() {
        let config = MatchingConfig::default();

        let inverted = PotentialMatchesQuery { min_age: Some(40), max_age: Some(20), ..Default::default() };
        assert!(matches!(MatchFilters::resolve(&inverted, &config), Err(MatchError::InvalidInput(_))));

        let negative = PotentialMatchesQuery { max_distance: Some(-1.0), ..Default::default() };
        assert!(MatchFilters::resolve(&negative, &config).is_err());
    }

    #[tokio::test]
    async fn test_sorted_and_distance_filtered() {
        let (_, orchestrator) = setup(
            vec![
                create_candidate("far", 22, "female", 43.6532, -79.3832),  // Toronto, ~96km
                create_candidate("mid", 22, "female", 43.45, -80.49),      // Kitchener, ~5km
                create_candidate("near", 22, "female", 43.4725, -80.5450), // same campus
            ],
            MatchingConfig::default(),
        )
        .await;

        let result = orchestrator.list_potential_matches("me", &default_filters()).await.unwrap();

        let ids: Vec<&str> = result.matches.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert_eq!(result.count, 2);
        assert!(result.matches.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[tokio::test]
    async fn test_ties_broken_by_id() {
        let (_, orchestrator) = setup(
            vec![
                create_candidate("b", 22, "female", 43.48, -80.54),
                create_candidate("a", 22, "female", 43.48, -80.54),
            ],
            MatchingConfig::default(),
        )
        .await;

        let result = orchestrator.list_potential_matches("me", &default_filters()).await.unwrap();
        let ids: Vec<&str> = result.matches.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_candidates_without_location_skipped() {
        let no_location = User::new("nowhere", "nowhere@uwaterloo.ca")
            .with_profile(Profile::new("Nowhere", 22, "female"));
        let (_, orchestrator) = setup(vec![no_location], MatchingConfig::default()).await;

        let result = orchestrator.list_potential_matches("me", &default_filters()).await.unwrap();
        assert!(result.matches.is_empty());
    }

    #[tokio::test]
    async fn test_status_annotation() {
        let (_, orchestrator) = setup(
            vec![
                create_candidate("liked", 22, "female", 43.48, -80.54),
                create_candidate("fresh", 22, "female", 43.48, -80.54),
            ],
            MatchingConfig::default(),
        )
        .await;

        orchestrator.request_match("me", "liked").await.unwrap();
        let result = orchestrator.list_potential_matches("me", &default_filters()).await.unwrap();

        let status_of = |id: &str| {
            result.matches.iter().find(|m| m.user_id == id).and_then(|m| m.match_status)
        };
        assert_eq!(status_of("liked"), Some(MatchStatus::Pending));
        assert_eq!(status_of("fresh"), None);
    }

    #[tokio::test]
    async fn test_requester_without_location_uses_fallback() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_user(User::new("me", "me@uwaterloo.ca").with_profile(Profile::new("Me", 22, "male")))
            .await;
        store.insert_user(create_candidate("near", 22, "female", 43.4725, -80.5450)).await;

        let without = MatchOrchestrator::new(store.clone(), store.clone(), MatchingConfig::default());
        let err = without.list_potential_matches("me", &default_filters()).await.unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput(_)));

        let config = MatchingConfig {
            fallback_location: Some(GeoPoint { latitude: ORIGIN.0, longitude: ORIGIN.1 }),
            ..MatchingConfig::default()
        };
        let with = MatchOrchestrator::new(store.clone(), store, config);
        let result = with.list_potential_matches("me", &default_filters()).await.unwrap();
        assert_eq!(result.count, 1);
    }

    #[tokio::test]
    async fn test_unknown_requester_not_found() {
        let (_, orchestrator) = setup(vec![], MatchingConfig::default()).await;
        let err = orchestrator.list_potential_matches("ghost", &default_filters()).await.unwrap_err();
        assert!(matches!(err, MatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_request_match_messages() {
        let (_, orchestrator) =
            setup(vec![create_candidate("her", 22, "female", 43.48, -80.54)], MatchingConfig::default()).await;

        let first = orchestrator.request_match("me", "her").await.unwrap();
        assert!(first.created);
        assert_eq!(first.message(), "Match request sent");

        let repeat = orchestrator.request_match("me", "her").await.unwrap();
        assert!(!repeat.created);
        assert_eq!(repeat.message(), "Match already exists with status: pending");

        let back = orchestrator.request_match("her", "me").await.unwrap();
        assert_eq!(back.status, MatchStatus::Accepted);
        assert_eq!(back.message(), "Match accepted!");
    }
}
