use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchStatus, Profile};

/// One entry of the potential matches list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub bio: String,
    pub program: String,
    #[serde(rename = "graduationYear")]
    pub graduation_year: Option<i32>,
    pub photos: Vec<String>,
    /// Rounded to one decimal
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    #[serde(rename = "matchStatus")]
    pub match_status: Option<MatchStatus>,
}

/// Response for the potential matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialMatchesResponse {
    pub matches: Vec<MatchCandidate>,
    pub count: usize,
}

/// Response for a match request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequestResponse {
    pub message: String,
    pub status: MatchStatus,
}

/// Response for the profile endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub is_verified: bool,
    pub profile: Option<Profile>,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
