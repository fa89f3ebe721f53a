//! API request handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::routes::AppState;
use crate::error::Error;
use crate::store::{validate_car_query, CarFilter, RawCarQuery};
use crate::types::{CarsResponse, ErrorResponse, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Get a single user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "Positive numeric user id")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Invalid user ID", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, Error> {
    let user = state.dataset.find_user_by_param(&id)?;
    Ok(Json(user.clone()))
}

/// Search cars with optional AND-combined filters
#[utoipa::path(
    get,
    path = "/cars",
    params(CarFilter),
    responses(
        (status = 200, description = "Matching cars", body = CarsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "cars"
)]
pub async fn search_cars(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<CarsResponse>, Error> {
    let raw = RawCarQuery::from_pairs(pairs);
    let filter = validate_car_query(&raw).map_err(|issues| {
        tracing::debug!("Rejected car query {:?}: {} issue(s)", raw, issues.len());
        Error::InvalidQuery(issues)
    })?;

    let content = state.dataset.search_cars(&filter);
    tracing::debug!("Car search {:?} matched {} car(s)", filter, content.len());

    Ok(Json(CarsResponse { content }))
}
