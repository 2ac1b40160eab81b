use crate::core::{InMemoryDonorIndex, MatchOutcome, Matcher};
use crate::error::ImputeError;
use crate::models::{
    DonorMatchRequest, DonorMatchResponse, ErrorResponse, HealthResponse,
    HouseholdImputationRequest, HouseholdImputationResponse,
};
use crate::services::{DonorSource, IndexCache};
use actix_web::{web, HttpResponse, Responder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub donors: DonorSource,
    pub indexes: Arc<IndexCache>,
    pub matcher: Matcher,
    /// Shared random stream for requests that carry no seed
    pub rng: Arc<tokio::sync::Mutex<ChaCha20Rng>>,
}

impl AppState {
    pub fn new(donors: DonorSource, indexes: Arc<IndexCache>, matcher: Matcher, rng_seed: u64) -> Self {
        Self {
            donors,
            indexes,
            matcher,
            rng: Arc::new(tokio::sync::Mutex::new(ChaCha20Rng::seed_from_u64(rng_seed))),
        }
    }

    /// Random stream for one request
    ///
    /// A request seed gives a reproducible stream; otherwise the stream is
    /// seeded from the shared one, so results depend on request order.
    async fn request_rng(&self, seed: Option<u64>) -> ChaCha20Rng {
        match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => {
                let mut shared = self.rng.lock().await;
                ChaCha20Rng::seed_from_u64(shared.gen())
            }
        }
    }

    async fn index_for(&self, year: i32) -> Result<Arc<InMemoryDonorIndex>, HttpResponse> {
        let age_top_code = self.matcher.params().age_top_code;
        self.indexes
            .get_or_load(year, &self.donors, age_top_code)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load donor index for {}: {}", year, e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to load donor population".to_string(),
                    message: e.to_string(),
                    status_code: 500,
                })
            })
    }
}

/// Configure all imputation-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/donors/match", web::post().to(match_donor))
        .route("/imputations/household", web::post().to(impute_household));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let source_healthy = state.donors.health_check().await;

    let status = if source_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        loaded_indexes: state.indexes.stats().loaded_indexes,
    })
}

/// Donor match endpoint
///
/// POST /api/v1/donors/match
///
/// Request body:
/// ```json
/// {
///   "year": 2024,
///   "seed": 42,
///   "profile": { "occupancy": "singleFemale", "region": "UKI", "numberOfChildren": 2,
///                "female": { "age": 35, "potentialHourlyWage": 10.0, "labour": "16-29h" } }
/// }
/// ```
async fn match_donor(
    state: web::Data<AppState>,
    req: web::Json<DonorMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let index = match state.index_for(req.year).await {
        Ok(index) => index,
        Err(response) => return response,
    };

    let mut rng = state.request_rng(req.seed).await;
    let request_id = uuid::Uuid::new_v4().to_string();

    match state.matcher.find_donor(index.as_ref(), &req.profile, &mut rng) {
        Ok(MatchOutcome::Matched { donor, level }) => {
            tracing::debug!("Request {}: donor {} at {}", request_id, donor.donor_id, level);
            HttpResponse::Ok().json(DonorMatchResponse {
                request_id,
                matched: true,
                donor_id: Some(donor.donor_id),
                level: Some(level),
                level_number: Some(level.number()),
            })
        }
        Ok(MatchOutcome::Unmatched) => {
            tracing::debug!("Request {}: no donor for {} household", request_id, req.profile.occupancy);
            HttpResponse::Ok().json(DonorMatchResponse {
                request_id,
                matched: false,
                donor_id: None,
                level: None,
                level_number: None,
            })
        }
        Err(e) => impute_error_response(&e),
    }
}

/// Household imputation endpoint
///
/// POST /api/v1/imputations/household
///
/// Labour configurations are imputed in request order with one random
/// stream, so a fixed seed reproduces the response.
async fn impute_household(
    state: web::Data<AppState>,
    req: web::Json<HouseholdImputationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let index = match state.index_for(req.year).await {
        Ok(index) => index,
        Err(response) => return response,
    };

    let Some(median_income) = req.median_income.or_else(|| index.median_gross_income()) else {
        return HttpResponse::UnprocessableEntity().json(ErrorResponse {
            error: "No reference median income".to_string(),
            message: format!("donor population for {} is empty", req.year),
            status_code: 422,
        });
    };

    tracing::info!(
        "Imputing household {} ({} configurations, year {}, median {:.2})",
        req.household_id,
        req.options.len(),
        req.year,
        median_income
    );

    let mut rng = state.request_rng(req.seed).await;

    match state.matcher.impute_household(
        index.as_ref(),
        &req.household_id,
        &req.options,
        median_income,
        &mut rng,
    ) {
        Ok(imputation) => {
            let request_id = uuid::Uuid::new_v4().to_string();
            HttpResponse::Ok().json(HouseholdImputationResponse::new(request_id, req.year, imputation))
        }
        Err(e) => impute_error_response(&e),
    }
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: field_errors={:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn impute_error_response(err: &ImputeError) -> HttpResponse {
    if err.is_malformed_input() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Malformed household".to_string(),
            message: err.to_string(),
            status_code: 400,
        });
    }

    match err {
        ImputeError::NoDonorForHousehold { .. } => {
            tracing::error!("{}", err);
            HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: "No donor for household".to_string(),
                message: err.to_string(),
                status_code: 422,
            })
        }
        _ => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Invalid matching parameters".to_string(),
            message: err.to_string(),
            status_code: 500,
        }),
    }
}
