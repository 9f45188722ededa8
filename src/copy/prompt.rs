use crate::models::ProductInput;

/// Free-text generation prompt for a product page.
pub fn build_prompt(product: &ProductInput) -> String {
    let keywords: Vec<&str> = [product.primary_keyword(), product.secondary_keyword()]
        .into_iter()
        .flatten()
        .collect();

    let context: Vec<String> = [
        product.audience().map(|a| format!("Target audience: {a}.")),
        (!keywords.is_empty()).then(|| format!("Focus keywords: {}.", keywords.join(", "))),
        product.tone.map(|t| format!("Preferred tone: {t}.")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let price = if product.price.is_finite() { product.price } else { 0.0 };
    let segments = [
        format!(
            "Create a persuasive product page with hook, benefits, features, specs, use cases, what's included, reviews, and CTA for {}.",
            product.title.trim()
        ),
        context.join(" "),
        format!("Base description: {}.", product.description.trim()),
        format!("Price: ${price:.2}."),
    ];

    segments.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}
