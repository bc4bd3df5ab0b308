use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{QuoteError, SchoolId, Selection};
use super::repository::QuoteStore;
use super::service::{EstimateRequest, QuoteService, QuoteServiceError};

/// `POST /api/v1/quotes` body: the school plus a complete selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuotePayload {
    pub school_id: SchoolId,
    #[serde(flatten)]
    pub selection: Selection,
}

/// Router exposing the estimator and quote persistence over HTTP.
pub fn quote_router<S>(service: Arc<QuoteService<S>>) -> Router
where
    S: QuoteStore + 'static,
{
    Router::new()
        .route("/api/v1/quotes", post(save_handler::<S>))
        .route("/api/v1/quotes/schools", get(schools_handler::<S>))
        .route("/api/v1/quotes/estimate", post(estimate_handler::<S>))
        .with_state(service)
}

pub(crate) async fn schools_handler<S>(State(service): State<Arc<QuoteService<S>>>) -> Response
where
    S: QuoteStore + 'static,
{
    let schools = service.schools();
    (StatusCode::OK, axum::Json(json!({ "schools": schools }))).into_response()
}

pub(crate) async fn estimate_handler<S>(
    State(service): State<Arc<QuoteService<S>>>,
    axum::Json(request): axum::Json<EstimateRequest>,
) -> Response
where
    S: QuoteStore + 'static,
{
    match service.estimate(&request, service.today()) {
        Ok(estimate) => (StatusCode::OK, axum::Json(estimate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_handler<S>(
    State(service): State<Arc<QuoteService<S>>>,
    axum::Json(payload): axum::Json<SaveQuotePayload>,
) -> Response
where
    S: QuoteStore + 'static,
{
    let today = service.today();
    match service
        .save_selection(&payload.school_id, &payload.selection, today)
        .await
    {
        Ok(saved) => (StatusCode::CREATED, axum::Json(saved)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: QuoteServiceError) -> Response {
    let status = match &error {
        QuoteServiceError::UnknownSchool(_) => StatusCode::NOT_FOUND,
        QuoteServiceError::Quote(QuoteError::InvalidSelection(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        QuoteServiceError::Quote(QuoteError::InvalidCatalog(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        QuoteServiceError::Persistence(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
