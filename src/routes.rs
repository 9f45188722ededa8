use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{
    copy::{build_fallback, build_prompt},
    error::ApiError,
    export::{export_document, export_filename},
    gemini::{generate_copy, TextGenerator},
    generation::{resolve, CopyService},
    jobs::{Job, JobQueue, JobSpec},
    models::{GenerateCopyRequest, GenerateCopyResponse, GeneratedCopyResult, PageRequest, ProductPage, ScrapeRequest, ScrapedProduct},
    notify::{Notifier, Toast, ToastKind},
    scrape::{validate_url, ProductScraper},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<HashMap<Uuid, ProductPage>>>,
    pub generator: Arc<dyn TextGenerator>,
    pub copy_service: Arc<dyn CopyService>,
    pub scraper: Arc<dyn ProductScraper>,
    pub jobs: JobQueue,
    pub notifier: Notifier,
    pub request_timeout: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_product))
        .route("/api/generate-copy", post(generate_copy_text))
        .route("/api/fallback", post(fallback_copy))
        .route("/api/pages", post(create_page))
        .route("/api/pages/:id", get(get_page))
        .route("/api/pages/:id/export", get(export_page))
        .route("/api/jobs", post(schedule_job))
        .route("/api/jobs/:payload_id", get(get_jobs))
        .route("/api/jobs/:payload_id/retry", post(retry_job))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/:id", delete(dismiss_notification))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn scrape_product(State(state): State<AppState>, Json(body): Json<ScrapeRequest>) -> Result<Json<ScrapedProduct>, ApiError> {
    let url = validate_url(&body.url)?;
    let product = state.scraper.scrape(&url).await?;
    Ok(Json(product))
}

pub async fn generate_copy_text(
    State(state): State<AppState>,
    Json(body): Json<GenerateCopyRequest>,
) -> Result<Json<GenerateCopyResponse>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("A non-empty \"prompt\" is required.".into()));
    }
    Ok(Json(generate_copy(state.generator.as_ref(), &body.prompt).await))
}

pub async fn fallback_copy(Json(body): Json<PageRequest>) -> Json<GeneratedCopyResult> {
    let prompt = body.prompt.unwrap_or_else(|| build_prompt(&body.product));
    Json(build_fallback(&body.product, &prompt))
}

pub async fn create_page(State(state): State<AppState>, Json(body): Json<PageRequest>) -> Result<Json<ProductPage>, ApiError> {
    body.product.validate().map_err(ApiError::Validation)?;
    let prompt = body
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| build_prompt(&body.product));

    info!("🚀 Generating product page for: {}", body.product.title);
    let outcome = resolve(state.copy_service.as_ref(), &body.product, &prompt, state.request_timeout).await;
    if let Some(advisory) = &outcome.advisory {
        state.notifier.show(advisory.clone(), ToastKind::Warning, None);
    }

    let page = ProductPage {
        id: Uuid::new_v4(),
        product: body.product,
        prompt,
        result: outcome.result,
        advisory: outcome.advisory,
        created_at: Utc::now(),
    };
    state.store.write().insert(page.id, page.clone());
    info!("✅ Page {} generated with {} blocks ({})", page.id, page.result.blocks.len(), page.result.framework);
    Ok(Json(page))
}

pub async fn get_page(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<ProductPage>, ApiError> {
    let page = state.store.read().get(&id).cloned();
    page.map(Json).ok_or_else(|| page_not_found(id))
}

pub async fn export_page(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let page = state.store.read().get(&id).cloned().ok_or_else(|| page_not_found(id))?;
    let document = export_document(&page.result.headline, &page.result.html)?;
    let filename = export_filename(&page.product.title);
    info!("📦 Exporting page {} as {}", id, filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        document,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleJobRequest {
    pub url: String,
    #[serde(default)]
    pub payload_id: Option<Uuid>,
}

pub async fn schedule_job(State(state): State<AppState>, Json(body): Json<ScheduleJobRequest>) -> Result<impl IntoResponse, ApiError> {
    let payload_id = state.jobs.schedule(JobSpec::Scrape { url: body.url }, body.payload_id)?;
    Ok(Json(json!({ "payloadId": payload_id })))
}

pub async fn get_jobs(Path(payload_id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<Vec<Job>>, ApiError> {
    let jobs = state.jobs.jobs_for(payload_id);
    if jobs.is_empty() {
        return Err(ApiError::NotFound(format!("No jobs for payloadId: {}", payload_id)));
    }
    Ok(Json(jobs))
}

pub async fn retry_job(Path(payload_id): Path<Uuid>, State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let payload_id = state.jobs.retry(payload_id)?;
    Ok(Json(json!({ "payloadId": payload_id })))
}

pub async fn list_notifications(State(state): State<AppState>) -> Json<Vec<Toast>> {
    Json(state.notifier.snapshot())
}

pub async fn dismiss_notification(Path(id): Path<u64>, State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if state.notifier.dismiss(id) {
        Ok(axum::http::StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Notification {} not found", id)))
    }
}

fn page_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Page {} not found", id))
}
