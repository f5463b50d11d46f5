use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Query string of `GET /matches/potential`
///
/// Unset fields fall back to the configured matching defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_age_bounds"))]
pub struct PotentialMatchesQuery {
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance: Option<f64>,
    #[validate(range(max = 150))]
    pub min_age: Option<u32>,
    #[validate(range(max = 150))]
    pub max_age: Option<u32>,
    pub gender: Option<String>,
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}

fn validate_age_bounds(query: &PotentialMatchesQuery) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (query.min_age, query.max_age) {
        if min > max {
            let mut err = ValidationError::new("age_range");
            err.message = Some("min_age must not exceed max_age".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Body of `PUT /users/profile`; only provided fields are changed
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(max = 150))]
    pub age: Option<u32>,
    #[validate(length(min = 1, max = 50))]
    pub gender: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 2000))]
    pub interests: Option<String>,
    #[validate(length(max = 200))]
    pub program: Option<String>,
    #[validate(range(min = 1900, max = 2200))]
    pub graduation_year: Option<i32>,
    #[validate(length(max = 20))]
    pub photos: Option<Vec<String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Remove the stored location; cannot be combined with coordinates
    #[serde(default)]
    pub clear_location: bool,
}
