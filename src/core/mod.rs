// Core algorithm exports
pub mod distance;
pub mod error;
pub mod filters;
pub mod match_state;
pub mod matcher;
pub mod profile;

pub use distance::{haversine_distance, distance_between, validate_coordinates, round_km};
pub use error::MatchError;
pub use filters::{matches_query_constraints, CandidateCriteria, CandidateFilter};
pub use match_state::{next_transition, MatchOutcome, MatchStateStore, Transition};
pub use matcher::{MatchFilters, MatchOrchestrator, MatchResult, PotentialMatches};
pub use profile::apply_update;
