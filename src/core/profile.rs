use chrono::{DateTime, Utc};

use crate::core::distance::validate_coordinates;
use crate::core::MatchError;
use crate::models::{Profile, UpdateProfileRequest};

/// Merge a partial update into a user's profile
///
/// A user without a profile needs name, age and gender to create one.
/// The result must carry both coordinates or neither; `clear_location`
/// drops both. `last_active` is always set to `now`.
pub fn apply_update(
    existing: Option<Profile>,
    update: &UpdateProfileRequest,
    now: DateTime<Utc>,
) -> Result<Profile, MatchError> {
    let mut profile = match existing {
        Some(profile) => profile,
        None => match (&update.name, update.age, &update.gender) {
            (Some(name), Some(age), Some(gender)) => Profile::new(name.clone(), age, gender.clone()),
            _ => {
                return Err(MatchError::InvalidInput(
                    "name, age and gender are required to create a profile".to_string(),
                ))
            }
        },
    };

    if let Some(name) = &update.name {
        profile.name = name.clone();
    }
    if let Some(age) = update.age {
        profile.age = age;
    }
    if let Some(gender) = &update.gender {
        profile.gender = gender.clone();
    }
    if let Some(bio) = &update.bio {
        profile.bio = bio.clone();
    }
    if let Some(interests) = &update.interests {
        profile.interests = interests.clone();
    }
    if let Some(program) = &update.program {
        profile.program = program.clone();
    }
    if update.graduation_year.is_some() {
        profile.graduation_year = update.graduation_year;
    }
    if let Some(photos) = &update.photos {
        profile.photos = photos.clone();
    }
    if update.clear_location {
        if update.latitude.is_some() || update.longitude.is_some() {
            return Err(MatchError::InvalidInput(
                "clear_location cannot be combined with coordinates".to_string(),
            ));
        }
        profile.latitude = None;
        profile.longitude = None;
    }
    if update.latitude.is_some() {
        profile.latitude = update.latitude;
    }
    if update.longitude.is_some() {
        profile.longitude = update.longitude;
    }

    match (profile.latitude, profile.longitude) {
        (Some(latitude), Some(longitude)) => validate_coordinates(latitude, longitude)?,
        (None, None) => {}
        _ => {
            return Err(MatchError::InvalidInput(
                "latitude and longitude must be set together".to_string(),
            ))
        }
    }

    profile.last_active = Some(now);
    Ok(profile)
}
