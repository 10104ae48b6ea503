//! HTTP surface for the screening portal.
//!
//! A compact Axum router over the screening service:
//!
//! - `POST /listings` – Create a listing namespace for a property address.
//! - `GET /listings` – Enumerate listing addresses.
//! - `GET /listings/:address/tenants` – Tenants with documents under an address.
//! - `GET /listings/:address/tenants/:tenant/documents` – A tenant's documents with
//!   presigned download URLs and type classifications.
//! - `POST /agents` – Build (or reuse) the conversational agent for a tenant,
//!   returning ingestion counts and any per-document failures.
//! - `POST /chat` – Ask the tenant agent one question; the answer streams back as
//!   plain text chunks.
//! - `POST /evaluations` – One-shot tenant-fit verdict on the first document matching
//!   a category tag.
//! - `GET /metrics` – Screening counters.

use crate::screening::{DocumentInfo, IngestionFailure, ScreeningApi, ScreeningError};
use crate::storage::StoreError;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Build the HTTP router exposing the screening API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ScreeningApi + 'static,
{
    Router::new()
        .route("/listings", post(create_listing::<S>).get(list_listings::<S>))
        .route("/listings/:address/tenants", get(list_tenants::<S>))
        .route(
            "/listings/:address/tenants/:tenant/documents",
            get(list_documents::<S>),
        )
        .route(
            "/listings/:address/tenants/:tenant/categories",
            get(list_categories::<S>),
        )
        .route("/agents", post(build_agent::<S>))
        .route("/chat", post(chat::<S>))
        .route("/evaluations", post(evaluate::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Request body for `POST /listings`.
#[derive(Deserialize)]
struct CreateListingRequest {
    /// Property address to open a namespace for.
    address: String,
}

/// Create a listing namespace in the object store.
async fn create_listing<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<CreateListingRequest>,
) -> Result<StatusCode, AppError>
where
    S: ScreeningApi,
{
    service.create_listing(&request.address).await?;
    Ok(StatusCode::CREATED)
}

/// Response body for `GET /listings`.
#[derive(Serialize)]
struct ListingsResponse {
    listings: Vec<String>,
}

/// List known property addresses.
async fn list_listings<S>(State(service): State<Arc<S>>) -> Result<Json<ListingsResponse>, AppError>
where
    S: ScreeningApi,
{
    let listings = service.list_listings().await?;
    Ok(Json(ListingsResponse { listings }))
}

/// Response body for `GET /listings/:address/tenants`.
#[derive(Serialize)]
struct TenantsResponse {
    tenants: Vec<String>,
}

/// List tenants with uploaded material under one address.
async fn list_tenants<S>(
    State(service): State<Arc<S>>,
    Path(address): Path<String>,
) -> Result<Json<TenantsResponse>, AppError>
where
    S: ScreeningApi,
{
    let tenants = service.list_tenants(&address).await?;
    Ok(Json(TenantsResponse { tenants }))
}

/// Response body for the documents endpoint.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentInfo>,
}

/// List one tenant's documents with download URLs.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
    Path((address, tenant)): Path<(String, String)>,
) -> Result<Json<DocumentsResponse>, AppError>
where
    S: ScreeningApi,
{
    let documents = service.list_documents(&address, &tenant).await?;
    Ok(Json(DocumentsResponse { documents }))
}

/// Response body for the categories endpoint.
#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

/// List the distinct document categories one tenant has uploaded.
async fn list_categories<S>(
    State(service): State<Arc<S>>,
    Path((address, tenant)): Path<(String, String)>,
) -> Result<Json<CategoriesResponse>, AppError>
where
    S: ScreeningApi,
{
    let categories = service.list_categories(&address, &tenant).await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Request body for `POST /agents`.
#[derive(Deserialize)]
struct BuildAgentRequest {
    address: String,
    tenant: String,
}

/// Success response for `POST /agents`.
#[derive(Serialize)]
struct BuildAgentResponse {
    /// Whether an already-built agent was reused.
    cached: bool,
    /// Fragments held by the agent after this call.
    fragments: usize,
    /// Documents ingested by this build.
    ingested: usize,
    /// Documents skipped for unrecognized extensions.
    skipped_unsupported: usize,
    /// Documents that failed to ingest, with details.
    failures: Vec<IngestionFailure>,
}

/// Build or reuse the conversational agent for one tenant.
async fn build_agent<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<BuildAgentRequest>,
) -> Result<Json<BuildAgentResponse>, AppError>
where
    S: ScreeningApi,
{
    let summary = service.build_agent(&request.address, &request.tenant).await?;
    tracing::info!(
        address = request.address,
        tenant = request.tenant,
        cached = summary.cached,
        ingested = summary.ingested,
        failed = summary.failures.len(),
        "Agent build request completed"
    );
    Ok(Json(BuildAgentResponse {
        cached: summary.cached,
        fragments: summary.fragments,
        ingested: summary.ingested,
        skipped_unsupported: summary.skipped_unsupported,
        failures: summary.failures,
    }))
}

/// Request body for `POST /chat`.
#[derive(Deserialize)]
struct ChatRequest {
    address: String,
    tenant: String,
    question: String,
}

/// Ask the tenant agent one question, streaming the answer as plain text.
async fn chat<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError>
where
    S: ScreeningApi,
{
    let stream = service
        .chat(&request.address, &request.tenant, &request.question)
        .await?;
    let response = (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response();
    Ok(response)
}

/// Request body for `POST /evaluations`.
#[derive(Deserialize)]
struct EvaluationRequest {
    address: String,
    tenant: String,
    /// Document category tag to evaluate, matched case-insensitively.
    category: String,
}

/// Success response for `POST /evaluations`.
#[derive(Serialize)]
struct EvaluationResponse {
    verdict: String,
}

/// Produce a one-shot fitness verdict for one tenant document.
async fn evaluate<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, AppError>
where
    S: ScreeningApi,
{
    let verdict = service
        .evaluate(&request.address, &request.tenant, &request.category)
        .await?;
    Ok(Json(EvaluationResponse { verdict }))
}

/// Return screening counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: ScreeningApi,
{
    Json(service.metrics_snapshot())
}

struct AppError(ScreeningError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ScreeningError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
            ScreeningError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ScreeningError::Llm(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.0.to_string()).into_response()
    }
}

impl From<ScreeningError> for AppError {
    fn from(inner: ScreeningError) -> Self {
        Self(inner)
    }
}
