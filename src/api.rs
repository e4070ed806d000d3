// 🌐 REST API - Axum routes for ranking recomputation
// Every response body is { success, message, data }

use crate::db::{count_by_category, verify_count, CategoryCount};
use crate::error::RankingError;
use crate::model::Parameter;
use crate::recompute::{recompute, RecomputeRequest, RecomputeRow};
use crate::regions::RegionTable;
use crate::weights::{rebalance_input, validate, WeightSet};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

// ============================================================================
// Errors → HTTP
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<RankingError> for ApiError {
    fn from(err: RankingError) -> Self {
        let status = match &err {
            RankingError::NoMatchingRecords { .. } => StatusCode::NOT_FOUND,
            RankingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "request failed");
        }

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Request / response shapes
// ============================================================================

/// Query string for GET /api/ranking (legacy weight names rpp / perc).
/// Numbers stay raw text: anything that is not a positive integer counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct RankingParams {
    pub year: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub tlr: Option<String>,
    #[serde(alias = "rp")]
    pub rpp: Option<String>,
    pub go: Option<String>,
    pub oi: Option<String>,
    #[serde(alias = "pr")]
    pub perc: Option<String>,
}

fn positive<T: std::str::FromStr + PartialOrd + Default>(raw: &Option<String>) -> Option<T> {
    raw.as_deref()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

impl RankingParams {
    /// Weights only count when all five are given
    fn weights(&self) -> Option<WeightSet> {
        Some(WeightSet::new(
            positive(&self.tlr)?,
            positive(&self.rpp)?,
            positive(&self.go)?,
            positive(&self.oi)?,
            positive(&self.perc)?,
        ))
    }

    fn into_request(self) -> RecomputeRequest {
        let weights = self.weights();
        RecomputeRequest {
            year: positive(&self.year),
            category: self.category,
            state: self.state,
            region: self.region,
            weights,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RebalanceRequest {
    #[serde(default)]
    pub weights: WeightSet,
    pub parameter: String,
    /// Number or string; anything non-numeric means the parameter's minimum
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegionEntry {
    pub region: String,
    pub states: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_records: i64,
    pub by_category: Vec<CategoryCount>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK", "Service is healthy"))
}

/// GET /api/ranking - Listing or recomputation from the query string
async fn get_ranking(
    State(state): State<AppState>,
    params: Result<Query<RankingParams>, QueryRejection>,
) -> ApiResult<Vec<RecomputeRow>> {
    let Query(params) = params?;
    let request = params.into_request();

    let conn = state.conn()?;
    let rows = recompute(&*conn, &request)?;
    let message = if request.weights.is_some() {
        "Rankings recomputed successfully"
    } else {
        "Rankings retrieved successfully"
    };
    Ok(Json(ApiResponse::ok(rows, message)))
}

/// POST /api/parameters - Recompute with a submitted weight set
async fn post_parameters(
    State(state): State<AppState>,
    body: Result<Json<RecomputeRequest>, JsonRejection>,
) -> ApiResult<Vec<RecomputeRow>> {
    let Json(request) = body?;

    let weights = request
        .weights
        .as_ref()
        .ok_or(RankingError::MissingRequiredField("weights"))?;
    validate(weights)?;

    let conn = state.conn()?;
    let rows = recompute(&*conn, &request)?;
    Ok(Json(ApiResponse::ok(rows, "Rankings recomputed successfully")))
}

/// POST /api/weights/rebalance - Interactive single-parameter edit
async fn post_rebalance(
    body: Result<Json<RebalanceRequest>, JsonRejection>,
) -> ApiResult<WeightSet> {
    let Json(request) = body?;

    let parameter = Parameter::parse(&request.parameter)
        .ok_or_else(|| RankingError::UnknownParameter(request.parameter.clone()))?;

    let input = match &request.value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    };

    let balanced = rebalance_input(&request.weights, parameter, &input);
    Ok(Json(ApiResponse::ok(balanced, "Weights rebalanced")))
}

/// GET /api/regions - Region → states table
async fn get_regions() -> impl IntoResponse {
    let regions: Vec<RegionEntry> = RegionTable::global()
        .iter()
        .map(|(region, states)| RegionEntry {
            region: region.name().to_string(),
            states: states.iter().map(|s| s.to_string()).collect(),
        })
        .collect();

    Json(ApiResponse::ok(regions, "Regions retrieved successfully"))
}

/// GET /api/stats - Record counts per category and year
async fn get_stats(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let conn = state.conn()?;
    let total_records = verify_count(&conn)?;
    let by_category = count_by_category(&conn)?;

    let stats = StatsResponse {
        total_records,
        by_category,
    };
    Ok(Json(ApiResponse::ok(stats, "Statistics retrieved successfully")))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ranking", get(get_ranking))
        .route("/parameters", post(post_parameters))
        .route("/weights/rebalance", post(post_rebalance))
        .route("/regions", get(get_regions))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
