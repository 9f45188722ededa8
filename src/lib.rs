//! Product page copy generation: framework selection, block assembly, HTML
//! rendering and a deterministic fallback, served over an axum API with a
//! background scrape/AI job queue.

pub mod config;
pub mod copy;
pub mod error;
pub mod export;
pub mod gemini;
pub mod generation;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod routes;
pub mod scrape;

pub use config::AppConfig;
pub use error::ApiError;
pub use generation::{GenerationEvent, GenerationOrchestrator, Phase};
pub use routes::{router, AppState};
