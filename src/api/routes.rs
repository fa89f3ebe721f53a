//! API route definitions

use std::any::Any as PanicPayload;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{self, HealthResponse};
use crate::error::INTERNAL_ERROR_MESSAGE;
use crate::store::Dataset;
use crate::types::{Car, CarsResponse, ErrorResponse, FieldIssue, User};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Motorpool API",
        version = "0.1.0",
        description = "Read-only users and cars dataset"
    ),
    tags(
        (name = "users", description = "User lookup"),
        (name = "cars", description = "Car search"),
        (name = "health", description = "Health checks")
    ),
    paths(handlers::health, handlers::get_user, handlers::search_cars),
    components(schemas(
        User,
        Car,
        CarsResponse,
        ErrorResponse,
        FieldIssue,
        HealthResponse,
    ))
)]
pub struct ApiDoc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }
}

/// Turn a handler panic into the generic 500 body
fn panic_response(err: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: INTERNAL_ERROR_MESSAGE.into(),
            details: None,
        }),
    )
        .into_response()
}

/// Wrap a router with panic recovery, CORS and request tracing
fn with_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let openapi = ApiDoc::openapi();

    let routes = Router::new()
        .route("/users/{id}", get(handlers::get_user))
        .route("/cars", get(handlers::search_cars))

        // Health
        .route("/health", get(handlers::health))

        // OpenAPI document and Swagger UI
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi));

    with_layers(routes).with_state(state)
}
