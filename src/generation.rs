//! Generation cycles: one remote call per `(product, prompt)` signature,
//! normalized into a [`GeneratedCopyResult`], with local fallback whenever
//! the call fails.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::copy::{build_fallback, normalize, RemotePayload};
use crate::gemini::{generate_copy, TextGenerator};
use crate::models::{GenerateCopyRequest, GeneratedCopyResult, ProductInput};

pub const FALLBACK_ADVISORY: &str = "Failed to generate AI copy, using fallback content.";

#[derive(Debug, Error)]
pub enum CopyServiceError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("API error: {0}")] Status(String),
    #[error("Invalid response body: {0}")] Decode(String),
    #[error("Request timed out after {0:?}")] Timeout(Duration),
}

/// Remote copy-generation service. Returns the raw JSON payload; shape
/// checks happen in [`RemotePayload::classify`].
#[async_trait]
pub trait CopyService: Send + Sync {
    async fn generate(&self, request: &GenerateCopyRequest) -> Result<Value, CopyServiceError>;
}

/// Calls `POST {base}/api/generate-copy` over HTTP.
pub struct HttpCopyService {
    client: Client,
    endpoint: String,
}

impl HttpCopyService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CopyServiceError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| CopyServiceError::Http(e.to_string()))?;
        let endpoint = format!("{}/api/generate-copy", base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl CopyService for HttpCopyService {
    async fn generate(&self, request: &GenerateCopyRequest) -> Result<Value, CopyServiceError> {
        let response = self.client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CopyServiceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CopyServiceError::Status(status.to_string()));
        }
        response.json::<Value>().await.map_err(|e| CopyServiceError::Decode(e.to_string()))
    }
}

/// In-process service backed by a text generator. Produces the same legacy
/// `{copy, ...}` payload the HTTP endpoint serves.
pub struct ModelCopyService {
    generator: Arc<dyn TextGenerator>,
}

impl ModelCopyService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self { Self { generator } }
}

#[async_trait]
impl CopyService for ModelCopyService {
    async fn generate(&self, request: &GenerateCopyRequest) -> Result<Value, CopyServiceError> {
        let response = generate_copy(self.generator.as_ref(), &request.prompt).await;
        serde_json::to_value(response).map_err(|e| CopyServiceError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub result: GeneratedCopyResult,
    pub advisory: Option<String>,
}

/// One generation cycle. Any service failure, timeout included, yields the
/// local fallback plus an advisory message.
pub async fn resolve(
    service: &dyn CopyService,
    product: &ProductInput,
    prompt: &str,
    timeout: Duration,
) -> GenerationOutcome {
    let request = GenerateCopyRequest { prompt: prompt.to_string(), product: Some(product.clone()) };
    let response = match tokio::time::timeout(timeout, service.generate(&request)).await {
        Ok(response) => response,
        Err(_) => Err(CopyServiceError::Timeout(timeout)),
    };

    match response {
        Ok(value) => {
            let payload = RemotePayload::classify(&value);
            GenerationOutcome { result: normalize(&payload, product, prompt), advisory: None }
        }
        Err(e) => {
            warn!("⚠️ Copy service failed, using fallback content: {}", e);
            GenerationOutcome { result: build_fallback(product, prompt), advisory: Some(FALLBACK_ADVISORY.to_string()) }
        }
    }
}

/// Identity of a `(product, prompt)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(u64);

impl Signature {
    pub fn of(product: &ProductInput, prompt: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(product).unwrap_or_default().hash(&mut hasher);
        prompt.hash(&mut hasher);
        Signature(hasher.finish())
    }
}

#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Loading,
    Settled { result: Arc<GeneratedCopyResult>, advisory: Option<String> },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
    Settled { fallback: bool },
}

struct CycleState {
    phase: Phase,
    generation: u64,
    signature: Option<Signature>,
    in_flight: Option<AbortHandle>,
    current: Option<Arc<GeneratedCopyResult>>,
}

impl CycleState {
    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// Owns the request lifecycle for one consumer. Every signature change
/// aborts the outstanding call and starts a new cycle; only the newest
/// cycle may publish a result.
///
/// Library entry point for interactive callers (live previews, editors)
/// that feed inputs as they change. The HTTP API serves one-shot requests
/// and calls [`resolve`] directly.
pub struct GenerationOrchestrator {
    service: Arc<dyn CopyService>,
    timeout: Duration,
    events: mpsc::UnboundedSender<GenerationEvent>,
    state: Arc<Mutex<CycleState>>,
}

impl GenerationOrchestrator {
    pub fn new(service: Arc<dyn CopyService>, timeout: Duration) -> (Self, mpsc::UnboundedReceiver<GenerationEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let state = CycleState { phase: Phase::Idle, generation: 0, signature: None, in_flight: None, current: None };
        (Self { service, timeout, events, state: Arc::new(Mutex::new(state)) }, receiver)
    }

    pub fn phase(&self) -> Phase { self.state.lock().phase }

    pub fn current(&self) -> Option<Arc<GeneratedCopyResult>> { self.state.lock().current.clone() }

    /// Feeds the latest inputs. Must be called from within a tokio runtime.
    pub fn update(&self, product: Option<&ProductInput>, prompt: Option<&str>) {
        let prompt = prompt.filter(|p| !p.trim().is_empty());
        let (Some(product), Some(prompt)) = (product, prompt) else {
            self.clear();
            return;
        };

        let signature = Signature::of(product, prompt);
        let mut state = self.state.lock();
        if state.signature == Some(signature) && state.phase != Phase::Idle {
            return;
        }

        state.cancel_in_flight();
        state.generation += 1;
        state.signature = Some(signature);
        state.phase = Phase::Requesting;
        let generation = state.generation;
        debug!(generation, "starting generation cycle");
        let _ = self.events.send(GenerationEvent::Loading);

        let service = Arc::clone(&self.service);
        let shared = Arc::clone(&self.state);
        let events = self.events.clone();
        let timeout = self.timeout;
        let product = product.clone();
        let prompt = prompt.to_string();
        let task = tokio::spawn(async move {
            let outcome = resolve(service.as_ref(), &product, &prompt, timeout).await;
            settle(&shared, &events, generation, outcome);
        });
        state.in_flight = Some(task.abort_handle());
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.cancel_in_flight();
        state.generation += 1;
        state.signature = None;
        state.current = None;
        if state.phase != Phase::Idle {
            state.phase = Phase::Idle;
            let _ = self.events.send(GenerationEvent::Cleared);
        }
    }
}

impl Drop for GenerationOrchestrator {
    fn drop(&mut self) {
        self.state.lock().cancel_in_flight();
    }
}

/// Publishes a finished cycle unless a newer one has started since.
fn settle(
    state: &Mutex<CycleState>,
    events: &mpsc::UnboundedSender<GenerationEvent>,
    generation: u64,
    outcome: GenerationOutcome,
) -> bool {
    let mut state = state.lock();
    if state.generation != generation {
        debug!(generation, current = state.generation, "dropping superseded generation result");
        return false;
    }
    let result = Arc::new(outcome.result);
    state.in_flight = None;
    state.phase = Phase::Settled { fallback: outcome.advisory.is_some() };
    state.current = Some(Arc::clone(&result));
    info!(generation, framework = %result.framework, "✅ Generation cycle settled");
    let _ = events.send(GenerationEvent::Settled { result, advisory: outcome.advisory });
    true
}
