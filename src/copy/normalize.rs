use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::copy::fallback::build_fallback;
use crate::models::{GeneratedBlock, GeneratedCopyResult, MarketingFramework, ProductInput};

/// Remote generation payload, classified once on arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum RemotePayload {
    Structured(StructuredPayload),
    /// `{ "copy": "..." }` from text-only services. Seeds the local builder,
    /// never trusted as structured content.
    LegacyText(String),
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPayload {
    pub framework: MarketingFramework,
    pub headline: String,
    pub subheadline: Option<String>,
    pub synopsis: Option<String>,
    pub blocks: Vec<GeneratedBlock>,
    pub html: String,
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(default)]
    framework: Option<MarketingFramework>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    subheadline: Option<String>,
    #[serde(default)]
    synopsis: Option<String>,
    #[serde(default)]
    blocks: Option<Vec<GeneratedBlock>>,
    #[serde(default)]
    html: Option<String>,
}

impl RemotePayload {
    pub fn classify(value: &Value) -> Self {
        if let Ok(wire) = WirePayload::deserialize(value) {
            if let WirePayload {
                framework: Some(framework),
                headline: Some(headline),
                blocks: Some(blocks),
                html: Some(html),
                subheadline,
                synopsis,
            } = wire
            {
                if !blocks.is_empty() {
                    return RemotePayload::Structured(StructuredPayload { framework, headline, subheadline, synopsis, blocks, html });
                }
            }
        }
        match value.get("copy") {
            Some(Value::String(copy)) => RemotePayload::LegacyText(copy.clone()),
            _ => RemotePayload::Unrecognized,
        }
    }
}

/// Reconciles a remote payload with the expected result shape. Structured
/// payloads are adopted without re-validating block order or content.
pub fn normalize(payload: &RemotePayload, product: &ProductInput, prompt: &str) -> GeneratedCopyResult {
    match payload {
        RemotePayload::Structured(structured) => {
            debug!(framework = %structured.framework, blocks = structured.blocks.len(), "adopting structured remote copy");
            GeneratedCopyResult {
                framework: structured.framework,
                headline: structured.headline.clone(),
                subheadline: structured.subheadline.clone().unwrap_or_else(|| product.title.clone()),
                synopsis: structured.synopsis.clone().unwrap_or_else(|| product.description.clone()),
                blocks: structured.blocks.clone(),
                html: structured.html.clone(),
            }
        }
        RemotePayload::LegacyText(copy) => {
            debug!(copy_len = copy.len(), "remote returned text-only copy, building locally");
            build_fallback(product, copy)
        }
        RemotePayload::Unrecognized => {
            debug!("unrecognized remote payload, building locally");
            build_fallback(product, prompt)
        }
    }
}
