//! Copy pipeline: framework selection, block assembly, HTML rendering,
//! local fallback and reconciliation of remote responses.

pub mod blocks;
pub mod fallback;
pub mod framework;
pub mod normalize;
pub mod prompt;
pub mod render;

pub use blocks::{build_blocks, cta_label, hook_headline};
pub use fallback::{build_fallback, fallback_copy_text};
pub use framework::select_framework;
pub use normalize::{normalize, RemotePayload, StructuredPayload};
pub use prompt::build_prompt;
pub use render::render_document;
