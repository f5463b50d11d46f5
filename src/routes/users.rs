use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::{apply_update, MatchError};
use crate::models::{MessageResponse, ProfileResponse, UpdateProfileRequest};
use crate::routes::{validation_failed, AppState};
use crate::services::AuthenticatedUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/users/profile", web::get().to(get_profile))
        .route("/users/profile", web::put().to(update_profile));
}

/// GET /api/users/profile
async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, MatchError> {
    let stored = state
        .users
        .get_user(user.id())
        .await?
        .ok_or_else(|| MatchError::NotFound(format!("user {}", user.id())))?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        id: stored.id,
        email: stored.email,
        is_verified: stored.is_verified,
        profile: stored.profile,
    }))
}

/// PUT /api/users/profile
///
/// Only the provided fields change; `last_active` is always refreshed.
async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, MatchError> {
    if let Err(errors) = req.validate() {
        return Ok(validation_failed(errors));
    }

    let stored = state
        .users
        .get_user(user.id())
        .await?
        .ok_or_else(|| MatchError::NotFound(format!("user {}", user.id())))?;

    let profile = apply_update(stored.profile, &req, chrono::Utc::now())?;

    if !state.users.save_profile(user.id(), &profile).await? {
        return Err(MatchError::NotFound(format!("user {}", user.id())));
    }

    tracing::debug!("Updated profile for user {}", user.id());

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Profile updated successfully".to_string(),
    }))
}
