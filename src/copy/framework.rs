use crate::models::{MarketingFramework, ProductInput, ToneSetting};

pub const DEFAULT_FRAMEWORK: MarketingFramework = MarketingFramework::Aida;

/// Picks the persuasion framework for a product. Rules are checked in order
/// and the first match wins, so tone overrides keyword hints where it is
/// listed first.
pub fn select_framework(product: Option<&ProductInput>) -> MarketingFramework {
    let Some(product) = product else { return DEFAULT_FRAMEWORK };

    let tone = product.tone();
    let text = signal_text(product);
    let mentions = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if matches!(tone, ToneSetting::Professional | ToneSetting::Technical) {
        MarketingFramework::Fab
    } else if tone == ToneSetting::Inspirational || mentions(&["dream", "future"]) {
        MarketingFramework::Bab
    } else if mentions(&["problem", "struggle"]) || tone == ToneSetting::Bold {
        MarketingFramework::Pas
    } else if tone == ToneSetting::Luxury {
        MarketingFramework::FourPs
    } else {
        DEFAULT_FRAMEWORK
    }
}

fn signal_text(product: &ProductInput) -> String {
    let lists = [product.key_benefits.as_deref(), product.features.as_deref()];
    std::iter::once(product.description.as_str())
        .chain(lists.into_iter().flatten().flatten().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
