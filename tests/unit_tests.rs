// Unit tests for Campus Match

use campus_match::core::{
    distance::{haversine_distance, round_km, validate_coordinates},
    filters::{matches_query_constraints, CandidateCriteria},
    match_state::{next_transition, Transition},
};
use campus_match::models::{CandidateQuery, MatchRecord, MatchStatus, PairKey, Profile, User};
use chrono::Utc;
use geo::{point, HaversineDistance};

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(43.4723, -80.5449, 43.4723, -80.5449);
    assert_eq!(distance, 0.0);
}

#[test]
fn test_haversine_distance_waterloo_to_toronto() {
    let distance = haversine_distance(43.4723, -80.5449, 43.6532, -79.3832);
    assert!(distance >= 95.0 && distance <= 100.0, "Expected 95-100km, got {}", distance);
}

#[test]
fn test_haversine_distance_is_symmetric() {
    let pairs = [
        ((43.4723, -80.5449), (43.6532, -79.3832)),
        ((51.5074, -0.1278), (48.8566, 2.3522)),
        ((-33.8688, 151.2093), (35.6762, 139.6503)),
    ];

    for ((lat1, lon1), (lat2, lon2)) in pairs {
        assert_eq!(
            haversine_distance(lat1, lon1, lat2, lon2),
            haversine_distance(lat2, lon2, lat1, lon1)
        );
    }
}

#[test]
fn test_haversine_agrees_with_geo_crate() {
    // geo uses a 6371.0088km mean radius, so allow a small relative error
    let waterloo = point!(x: -80.5449, y: 43.4723);
    let toronto = point!(x: -79.3832, y: 43.6532);
    let reference_km = waterloo.haversine_distance(&toronto) / 1000.0;

    let distance = haversine_distance(43.4723, -80.5449, 43.6532, -79.3832);
    assert!((distance - reference_km).abs() / reference_km < 0.001);
}

#[test]
fn test_coordinates_out_of_range() {
    assert!(validate_coordinates(-90.0, -180.0).is_ok());
    assert!(validate_coordinates(-90.01, 0.0).is_err());
    assert!(validate_coordinates(0.0, 180.01).is_err());
}

#[test]
fn test_distance_rounding() {
    assert_eq!(round_km(95.7389), 95.7);
    assert_eq!(round_km(0.0), 0.0);
}

#[test]
fn test_constraints_never_include_requester() {
    let requester = User::new("me", "me@uwaterloo.ca")
        .with_profile(Profile::new("Me", 22, "female"));

    let query = CandidateCriteria::new(18, 100).to_query("me");
    assert!(!matches_query_constraints(&requester, &query));
}

#[test]
fn test_constraints_ignore_location() {
    let no_location = User::new("1", "1@uwaterloo.ca")
        .with_profile(Profile::new("No Location", 22, "female"));

    let query = CandidateQuery {
        min_age: 18,
        max_age: 30,
        gender: Some("female".to_string()),
        exclude_user_id: "me".to_string(),
        limit: 20,
    };
    assert!(matches_query_constraints(&no_location, &query));
}

#[test]
fn test_pair_key_canonical() {
    let forward = MatchRecord::pending("zed", "amy", Utc::now());
    assert_eq!(forward.pair_key(), PairKey::new("amy", "zed"));
    assert_eq!(forward.pair_key().low, "amy");
}

#[test]
fn test_state_machine_transitions() {
    let pending = MatchRecord::pending("a", "b", Utc::now());
    let accepted = MatchRecord {
        status: MatchStatus::Accepted,
        ..pending.clone()
    };

    assert_eq!(next_transition(None, "a", "b"), Transition::Create);
    assert_eq!(next_transition(Some(&pending), "a", "b"), Transition::Keep);
    assert_eq!(next_transition(Some(&pending), "b", "a"), Transition::Accept);
    assert_eq!(next_transition(Some(&accepted), "b", "a"), Transition::Keep);
}
