use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToneSetting {
    #[default]
    Balanced,
    Conversational,
    Professional,
    Bold,
    Luxury,
    Playful,
    Technical,
    Inspirational,
}

impl ToneSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToneSetting::Balanced => "balanced",
            ToneSetting::Conversational => "conversational",
            ToneSetting::Professional => "professional",
            ToneSetting::Bold => "bold",
            ToneSetting::Luxury => "luxury",
            ToneSetting::Playful => "playful",
            ToneSetting::Technical => "technical",
            ToneSetting::Inspirational => "inspirational",
        }
    }
}

impl fmt::Display for ToneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductReview {
    pub author: String,
    pub quote: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub primary_keyword: Option<String>,
    #[serde(default)]
    pub secondary_keyword: Option<String>,
    #[serde(default)]
    pub tone: Option<ToneSetting>,
    #[serde(default)]
    pub key_benefits: Option<Vec<String>>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub use_cases: Option<Vec<String>>,
    #[serde(default)]
    pub whats_included: Option<Vec<String>>,
    #[serde(default)]
    pub reviews: Option<Vec<ProductReview>>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl ProductInput {
    pub fn tone(&self) -> ToneSetting { self.tone.unwrap_or_default() }

    /// Optional free-text field, trimmed, `None` when blank.
    pub fn audience(&self) -> Option<&str> { non_blank(self.target_audience.as_deref()) }
    pub fn primary_keyword(&self) -> Option<&str> { non_blank(self.primary_keyword.as_deref()) }
    pub fn secondary_keyword(&self) -> Option<&str> { non_blank(self.secondary_keyword.as_deref()) }

    /// Form rules a product must satisfy before it is handed to generation.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.title.trim().chars().count() < 3 {
            errors.push(FieldError { field: "title", message: "Title is required (min 3 characters).".into() });
        }
        if self.description.trim().chars().count() < 10 {
            errors.push(FieldError { field: "description", message: "Description is required (min 10 characters).".into() });
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            errors.push(FieldError { field: "price", message: "Price must be a positive number.".into() });
        }
        if self.images.is_empty() {
            errors.push(FieldError { field: "images", message: "At least one image is required.".into() });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketingFramework {
    #[serde(rename = "AIDA")]
    Aida,
    #[serde(rename = "PAS")]
    Pas,
    #[serde(rename = "BAB")]
    Bab,
    #[serde(rename = "FAB")]
    Fab,
    #[serde(rename = "4Ps")]
    FourPs,
}

impl MarketingFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketingFramework::Aida => "AIDA",
            MarketingFramework::Pas => "PAS",
            MarketingFramework::Bab => "BAB",
            MarketingFramework::Fab => "FAB",
            MarketingFramework::FourPs => "4Ps",
        }
    }
}

impl fmt::Display for MarketingFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Hook,
    Summary,
    Features,
    Benefits,
    Specs, // reserved
    UseCases,
    WhatsIncluded,
    SocialProof,
    Cta,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Hook => "hook",
            BlockType::Summary => "summary",
            BlockType::Features => "features",
            BlockType::Benefits => "benefits",
            BlockType::Specs => "specs",
            BlockType::UseCases => "use_cases",
            BlockType::WhatsIncluded => "whats_included",
            BlockType::SocialProof => "social_proof",
            BlockType::Cta => "cta",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CallToAction {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub headline: String,
    pub body: String,
    #[serde(default)]
    pub bullets: Option<Vec<String>>,
    #[serde(default)]
    pub call_to_action: Option<CallToAction>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCopyResult {
    pub framework: MarketingFramework,
    pub headline: String,
    pub subheadline: String,
    pub synopsis: String,
    pub blocks: Vec<GeneratedBlock>,
    pub html: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateCopyRequest {
    pub prompt: String,
    #[serde(default)]
    pub product: Option<ProductInput>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CopySource {
    Gemini,
    Fallback,
}

/// Legacy text-only payload of the copy endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCopyResponse {
    pub copy: String,
    pub prompt: String,
    pub source: CopySource,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScrapedProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub url: String,
}

impl From<ScrapedProduct> for ProductInput {
    fn from(scraped: ScrapedProduct) -> Self {
        ProductInput {
            title: scraped.title,
            description: scraped.description,
            price: scraped.price,
            images: scraped.images,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PageRequest {
    pub product: ProductInput,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub id: Uuid,
    pub product: ProductInput,
    pub prompt: String,
    pub result: GeneratedCopyResult,
    pub advisory: Option<String>,
    pub created_at: DateTime<Utc>,
}
