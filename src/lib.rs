//! Campus Match - match discovery and match-state service
//!
//! Finds nearby candidates for a user by age, gender and great-circle
//! distance, and tracks the pending/accepted state of match requests
//! between pairs of users.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{haversine_distance, MatchError, MatchFilters, MatchOrchestrator, MatchResult, PotentialMatches};
pub use models::{User, Profile, MatchRecord, MatchStatus, MatchingConfig, MatchCandidate};
pub use services::{InMemoryStore, PostgresStore, UserStore, MatchStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        assert_eq!(haversine_distance(43.4723, -80.5449, 43.4723, -80.5449), 0.0);
        assert_eq!(MatchingConfig::default().default_limit, 20);
    }
}
