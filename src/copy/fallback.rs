use tracing::debug;

use crate::copy::blocks::{build_blocks, hook_headline, join_with_and, unique_items};
use crate::copy::framework::select_framework;
use crate::copy::render::render_document;
use crate::models::{GeneratedCopyResult, ProductInput};

/// Builds a complete result locally. This is the last-resort producer for
/// every failed or untrusted remote generation, so it has no error path.
pub fn build_fallback(product: &ProductInput, raw_prompt_or_copy: &str) -> GeneratedCopyResult {
    let framework = select_framework(Some(product));
    let blocks = build_blocks(product, framework);
    let title = product.title.trim();

    debug!(%framework, blocks = blocks.len(), seed_len = raw_prompt_or_copy.len(), "built fallback copy");

    let subheadline = match product.primary_keyword() {
        Some(keyword) => format!("Your go-to choice for {keyword}."),
        None => format!("Thoughtfully crafted for {}.", product.audience().unwrap_or("modern customers")),
    };

    let features: Vec<String> = unique_items(product.features.as_deref()).into_iter().take(2).collect();
    let feature_part = if features.is_empty() { "thoughtful design".to_string() } else { join_with_and(&features) };
    let benefit_part = unique_items(product.key_benefits.as_deref())
        .into_iter()
        .next()
        .unwrap_or_else(|| "everyday reliability".to_string());
    let synopsis = format!("{title} combines {feature_part} with {benefit_part}.");

    let html = render_document(product, &blocks);

    GeneratedCopyResult {
        framework,
        headline: hook_headline(framework, title),
        subheadline,
        synopsis,
        blocks,
        html,
    }
}

/// Markdown copy returned by the copy endpoint when the model is unavailable.
pub fn fallback_copy_text(prompt: &str) -> String {
    let prompt = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    let subject = if prompt.is_empty() { "your product" } else { prompt.as_str() };
    [
        format!("**Introducing {subject}**"),
        String::new(),
        "Experience the perfect blend of innovation and quality. Designed to delight, this offering delivers real value from the very first use.".to_string(),
        String::new(),
        "**Why customers love it**".to_string(),
        "- Thoughtfully crafted to solve real problems".to_string(),
        "- Reliable, durable, and built to impress".to_string(),
        "- Supported by a friendly team that cares".to_string(),
        String::new(),
        "Ready to level up your product experience? Act now and feel the difference.".to_string(),
    ]
    .join("\n")
}
