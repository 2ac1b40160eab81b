use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use donor_impute::config::{DonorSourceKind, Settings};
use donor_impute::core::Matcher;
use donor_impute::routes::{self, imputation::AppState};
use donor_impute::services::{DonorSource, IndexCache, PostgresClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the configured level applies
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging; LOG_LEVEL and LOG_FORMAT override the configured values
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting donor imputation service...");

    // Initialize donor source
    let donors = match settings.donors.source {
        DonorSourceKind::Postgres => {
            let Some(database) = settings.database.as_ref() else {
                return Err(startup_error(
                    "Donor source is postgres",
                    "no [database] section or DATABASE_URL configured",
                ));
            };

            let client = PostgresClient::from_settings(
                &database.url,
                database.max_connections,
                database.min_connections,
                database.acquire_timeout_secs,
                database.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!("PostgreSQL donor store initialized");
            DonorSource::Postgres(Arc::new(client))
        }
        DonorSourceKind::File => {
            info!("Reading donor populations from {}", settings.donors.directory);
            DonorSource::Files {
                directory: PathBuf::from(&settings.donors.directory),
            }
        }
    };

    // Initialize donor index cache
    let indexes = Arc::new(IndexCache::new(settings.cache.max_indexes, settings.cache.ttl_secs));
    info!(
        "Donor index cache initialized (max: {} years, TTL: {:?}s)",
        settings.cache.max_indexes, settings.cache.ttl_secs
    );

    // Initialize matcher with configured constants
    let params = settings.imputation.match_params();
    let matcher = Matcher::new(params.clone())
        .map_err(|e| startup_error("Invalid imputation settings", e))?;

    info!("Matcher initialized with params: {:?}", params);

    // Build application state
    let app_state = AppState::new(donors, indexes, matcher, settings.imputation.rng_seed);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
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
