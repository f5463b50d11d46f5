use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored user account with an optional dating profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            is_verified: false,
            created_at: Utc::now(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }
}

/// Dating profile attached to a user
///
/// `latitude` and `longitude` are either both set or both unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(name: impl Into<String>, age: u32, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            gender: gender.into(),
            bio: String::new(),
            program: String::new(),
            graduation_year: None,
            interests: String::new(),
            photos: Vec::new(),
            latitude: None,
            longitude: None,
            last_active: None,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, or `None` if either is missing
    #[inline]
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

/// Decimal-degree coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Relationship state between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unordered pair of user ids in canonical order (byte-wise sorted)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub low: String,
    pub high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { low: a.to_string(), high: b.to_string() }
        } else {
            Self { low: b.to_string(), high: a.to_string() }
        }
    }
}

/// Persisted match request between two users
///
/// Stored directionally (initiator -> target); looked up by [`PairKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub initiator_id: String,
    pub target_id: String,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    /// New pending request from `initiator_id` to `target_id`
    pub fn pending(initiator_id: &str, target_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            initiator_id: initiator_id.to_string(),
            target_id: target_id.to_string(),
            status: MatchStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.initiator_id, &self.target_id)
    }

    /// True if a request from `initiator` would be the reverse of this record
    #[inline]
    pub fn is_reciprocal_from(&self, initiator: &str, target: &str) -> bool {
        self.initiator_id == target && self.target_id == initiator
    }
}

/// Hard filters passed to the user store
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub min_age: u32,
    pub max_age: u32,
    pub gender: Option<String>,
    pub exclude_user_id: String,
    pub limit: usize,
}

/// Discovery defaults and limits
///
/// `fallback_location` is the origin used when a requester has no stored
/// location. Without it such requests are rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    pub max_distance_km: f64,
    pub default_min_age: u32,
    pub default_max_age: u32,
    pub default_limit: usize,
    pub max_limit: usize,
    pub fallback_location: Option<GeoPoint>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_distance_km: 50.0,
            default_min_age: 18,
            default_max_age: 100,
            default_limit: 20,
            max_limit: 100,
            fallback_location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(PairKey::new("alice", "bob"), PairKey::new("bob", "alice"));
        assert_eq!(PairKey::new("bob", "alice").low, "alice");
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut profile = Profile::new("Ada", 22, "female");
        assert!(profile.location().is_none());

        profile.latitude = Some(43.47);
        assert!(profile.location().is_none());

        profile.longitude = Some(-80.54);
        assert_eq!(
            profile.location(),
            Some(GeoPoint { latitude: 43.47, longitude: -80.54 })
        );
    }

    #[test]
    fn test_reciprocal_detection() {
        let record = MatchRecord::pending("a", "b", Utc::now());
        assert!(record.is_reciprocal_from("b", "a"));
        assert!(!record.is_reciprocal_from("a", "b"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MatchStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
