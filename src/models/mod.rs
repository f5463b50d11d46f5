// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{User, Profile, GeoPoint, MatchStatus, MatchRecord, PairKey, CandidateQuery, MatchingConfig};
pub use requests::{PotentialMatchesQuery, UpdateProfileRequest};
pub use responses::{MatchCandidate, PotentialMatchesResponse, MatchRequestResponse, ProfileResponse, MessageResponse, HealthResponse, ErrorResponse};
