use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::{MatchError, MatchFilters};
use crate::models::{HealthResponse, MatchRequestResponse, PotentialMatchesQuery, PotentialMatchesResponse};
use crate::routes::{validation_failed, AppState};
use crate::services::AuthenticatedUser;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/potential", web::get().to(potential_matches))
        .route("/matches/{target_user_id}", web::post().to(request_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match state.users.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Potential matches endpoint
///
/// GET /api/matches/potential?max_distance=50&min_age=18&max_age=30&gender=female&limit=20
///
/// Response body:
/// ```json
/// {
///   "matches": [{"userId": "...", "distanceKm": 1.2, "matchStatus": null, ...}],
///   "count": 1
/// }
/// ```
async fn potential_matches(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PotentialMatchesQuery>,
) -> Result<HttpResponse, MatchError> {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for potential matches query: {:?}", errors);
        return Ok(validation_failed(errors));
    }

    let filters = MatchFilters::resolve(&query, state.orchestrator.config())?;

    tracing::info!(
        "Finding matches for user: {}, max distance: {}km, limit: {}",
        user.id(),
        filters.max_distance_km,
        filters.criteria.limit
    );

    let result = state
        .orchestrator
        .list_potential_matches(user.id(), &filters)
        .await?;

    Ok(HttpResponse::Ok().json(PotentialMatchesResponse {
        matches: result.matches,
        count: result.count,
    }))
}

/// Match request endpoint
///
/// POST /api/matches/{target_user_id}
///
/// 201 when a new request was sent, 200 when the match already existed or
/// this request accepted it.
async fn request_match(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let target_id = path.into_inner();

    let result = state.orchestrator.request_match(user.id(), &target_id).await?;

    let body = MatchRequestResponse {
        message: result.message(),
        status: result.status,
    };

    if result.created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}
