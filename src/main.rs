use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use campus_match::config::{LogFormat, LoggingSettings, Settings, StorageBackend};
use campus_match::core::MatchOrchestrator;
use campus_match::models::ErrorResponse;
use campus_match::routes::{self, AppState};
use campus_match::services::{InMemoryStore, JwtValidator, MatchStore, PostgresStore, UserStore};
use std::sync::Arc;
use tracing::{error, info, warn};

/// JSON error response for JSON payload errors
#[derive(Debug)]
pub struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

fn init_tracing(logging: &LoggingSettings) -> std::io::Result<()> {
    let filter = logging
        .env_filter()
        .map_err(|e| io_error(format!("Configuration error: {}", e)))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration; the subscriber depends on the logging section
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error(format!("Configuration error: {}", e))
    })?;

    init_tracing(&settings.logging)?;

    info!("Starting Campus Match service...");
    info!("Configuration loaded successfully");

    // Initialize stores
    let (users, matches): (Arc<dyn UserStore>, Arc<dyn MatchStore>) = match settings.database.backend {
        StorageBackend::Postgres => {
            let url = settings
                .database
                .url
                .as_deref()
                .ok_or_else(|| io_error("database.url is required for the postgres backend".to_string()))?;

            let store = Arc::new(
                PostgresStore::from_settings(
                    url,
                    settings.database.max_connections,
                    settings.database.min_connections,
                    settings.database.acquire_timeout_secs,
                    settings.database.idle_timeout_secs,
                )
                .await
                .map_err(|e| {
                    error!("Failed to connect to PostgreSQL: {}", e);
                    io_error(format!("PostgreSQL connection error: {}", e))
                })?,
            );

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );
            let users: Arc<dyn UserStore> = store.clone();
            let matches: Arc<dyn MatchStore> = store;
            (users, matches)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            let matches: Arc<dyn MatchStore> = store;
            (users, matches)
        }
    };

    let matching = settings.matching.to_matching_config();
    match matching.fallback_location {
        Some(origin) => info!(
            "Fallback origin for users without a location: ({}, {})",
            origin.latitude, origin.longitude
        ),
        None => info!("No fallback origin configured; users without a location cannot search"),
    }

    let orchestrator = MatchOrchestrator::new(users.clone(), matches, matching);

    info!("Match orchestrator initialized with config: {:?}", orchestrator.config());

    // Build application state
    let app_state = AppState { users, orchestrator };
    let jwt = JwtValidator::new(&settings.auth.jwt_secret, settings.auth.leeway_secs);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(jwt.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
