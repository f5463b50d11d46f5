// Route exports
pub mod matches;
pub mod users;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use std::sync::Arc;

use crate::core::{MatchError, MatchOrchestrator};
use crate::models::ErrorResponse;
use crate::services::UserStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub orchestrator: MatchOrchestrator,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(matches::configure)
            .configure(users::configure),
    );
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::SelfMatch | MatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MatchError::Conflict(_) => StatusCode::CONFLICT,
            MatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// 400 response for a failed request validation
pub(crate) fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}
