use std::collections::HashSet;

use crate::models::{BlockType, CallToAction, GeneratedBlock, MarketingFramework, ProductInput};

pub const ADD_TO_CART_LABEL: &str = "Add to cart";
pub const ADD_TO_CART_DESCRIPTION: &str = "Secure checkout, fast shipping and hassle-free returns.";
const MAX_QUOTED_REVIEWS: usize = 2;
const BLANK_REVIEW_QUOTE: &str = "Highly recommended.";

pub fn hook_headline(framework: MarketingFramework, title: &str) -> String {
    match framework {
        MarketingFramework::Aida => format!("Discover {title}: the upgrade you have been waiting for"),
        MarketingFramework::Pas => format!("Stop settling for less. {title} fixes it"),
        MarketingFramework::Bab => format!("Picture your day after {title}"),
        MarketingFramework::Fab => format!("{title}: smart features, real advantages"),
        MarketingFramework::FourPs => format!("{title}: a promise of something exceptional"),
    }
}

pub fn cta_label(framework: MarketingFramework) -> &'static str {
    match framework {
        MarketingFramework::Aida => "Get yours today",
        MarketingFramework::Pas => "Solve it now",
        MarketingFramework::Bab => "Start your transformation",
        MarketingFramework::Fab => "See the difference",
        MarketingFramework::FourPs => "Claim yours now",
    }
}

/// Assembles the content blocks for one page in a fixed order:
/// hook, summary, features, benefits, use cases, what's included,
/// social proof and cta. Only hook, summary and cta are unconditional.
pub fn build_blocks(product: &ProductInput, framework: MarketingFramework) -> Vec<GeneratedBlock> {
    let title = product.title.trim();
    let features = unique_items(product.features.as_deref());
    let benefits = unique_items(product.key_benefits.as_deref());
    let use_cases = unique_items(product.use_cases.as_deref());
    let included = unique_items(product.whats_included.as_deref());

    let mut builder = BlockBuilder::default();

    let hook_body = match product.audience() {
        Some(audience) => format!("Made for {audience}, {title} fits right into the way you live and work."),
        None => format!("Meet {title}, thoughtfully designed to make every day a little better."),
    };
    builder.push(BlockType::Hook, "Why it matters", hook_headline(framework, title), hook_body, Vec::new(), None);

    let summary_body = match benefits.as_slice() {
        [] => format!("{title} delivers dependable quality you will notice from the very first use."),
        [only] => format!("The standout benefit of {title}: {only}."),
        many => format!("Top benefits include {}.", join_with_and(many)),
    };
    builder.push(BlockType::Summary, "At a glance", format!("Everything you need to know about {title}"), summary_body, Vec::new(), None);

    if !features.is_empty() {
        builder.push(
            BlockType::Features,
            "Key features",
            "Built with purpose".to_string(),
            format!("Every detail of {title} is there for a reason."),
            features,
            None,
        );
    }

    if !benefits.is_empty() {
        builder.push(
            BlockType::Benefits,
            "Benefits",
            format!("What {title} does for you"),
            "The results you can expect once it is part of your routine.".to_string(),
            benefits,
            None,
        );
    }

    if !use_cases.is_empty() {
        builder.push(
            BlockType::UseCases,
            "Perfect for",
            "Made for the moments that matter".to_string(),
            format!("{title} adapts to however you plan to use it."),
            use_cases,
            None,
        );
    }

    if !included.is_empty() {
        builder.push(
            BlockType::WhatsIncluded,
            "What's included",
            "Everything in the box".to_string(),
            "Unpack it and you are ready to go.".to_string(),
            included,
            None,
        );
    }

    let quotes: Vec<String> = product
        .reviews
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(MAX_QUOTED_REVIEWS)
        .map(|review| {
            let author = review.author.trim();
            let author = if author.is_empty() { "Verified customer" } else { author };
            let quote = review.quote.trim();
            let quote = if quote.is_empty() { BLANK_REVIEW_QUOTE } else { quote };
            format!("\u{201c}{}\u{201d} \u{2014} {}", quote, author)
        })
        .collect();
    if !quotes.is_empty() {
        builder.push(
            BlockType::SocialProof,
            "What customers say",
            "Loved by people like you".to_string(),
            quotes.join(" "),
            Vec::new(),
            None,
        );
    }

    let price_line = match format_price(product.price) {
        Some(price) => format!("Only {price}."),
        None => "Great value.".to_string(),
    };
    builder.push(
        BlockType::Cta,
        "Ready to order?",
        cta_label(framework).to_string(),
        format!("{price_line} Order today while stock lasts and start enjoying {title} sooner."),
        Vec::new(),
        Some(CallToAction {
            label: ADD_TO_CART_LABEL.to_string(),
            description: Some(ADD_TO_CART_DESCRIPTION.to_string()),
            url: None,
        }),
    );

    builder.blocks
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<GeneratedBlock>,
}

impl BlockBuilder {
    fn push(
        &mut self,
        block_type: BlockType,
        title: &str,
        headline: String,
        body: String,
        bullets: Vec<String>,
        call_to_action: Option<CallToAction>,
    ) {
        let id = format!("{}-{}", block_type.as_str(), self.blocks.len());
        self.blocks.push(GeneratedBlock {
            id,
            block_type,
            title: title.to_string(),
            headline,
            body,
            bullets: (!bullets.is_empty()).then_some(bullets),
            call_to_action,
        });
    }
}

/// Trimmed, non-empty entries in first-seen order with duplicates removed.
pub fn unique_items(items: Option<&[String]>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .unwrap_or_default()
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty() && seen.insert(*item))
        .map(str::to_string)
        .collect()
}

/// "A", "A and B", "A, B and C".
pub fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// `$12.50`, or `None` when the price is zero, negative or not a number.
pub fn format_price(price: f64) -> Option<String> {
    (price.is_finite() && price > 0.0).then(|| format!("${price:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductReview;
    use pretty_assertions::assert_eq;

    fn mug() -> ProductInput {
        ProductInput {
            title: "Mug".into(),
            description: "A great mug for coffee lovers".into(),
            price: 9.99,
            images: vec!["img.png".into()],
            ..Default::default()
        }
    }

    fn types(blocks: &[GeneratedBlock]) -> Vec<BlockType> {
        blocks.iter().map(|b| b.block_type).collect()
    }

    #[test]
    fn minimal_product_emits_hook_summary_cta() {
        let blocks = build_blocks(&mug(), MarketingFramework::FourPs);
        assert_eq!(types(&blocks), vec![BlockType::Hook, BlockType::Summary, BlockType::Cta]);
        let ids: Vec<_> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["hook-0", "summary-1", "cta-2"]);
        assert_eq!(blocks[2].headline, cta_label(MarketingFramework::FourPs));
    }

    #[test]
    fn full_product_emits_blocks_in_fixed_order() {
        let mut p = mug();
        p.features = Some(vec!["Double wall".into()]);
        p.key_benefits = Some(vec!["Hot coffee".into()]);
        p.use_cases = Some(vec!["Office".into()]);
        p.whats_included = Some(vec!["Lid".into()]);
        p.reviews = Some(vec![ProductReview { author: "Ana".into(), quote: "Love it".into() }]);
        let blocks = build_blocks(&p, MarketingFramework::Aida);
        assert_eq!(
            types(&blocks),
            vec![
                BlockType::Hook,
                BlockType::Summary,
                BlockType::Features,
                BlockType::Benefits,
                BlockType::UseCases,
                BlockType::WhatsIncluded,
                BlockType::SocialProof,
                BlockType::Cta,
            ]
        );
        assert_eq!(blocks[4].id, "use_cases-4");
        assert_eq!(blocks[7].id, "cta-7");
    }

    #[test]
    fn features_are_deduplicated_in_order() {
        let mut p = mug();
        p.features = Some(vec!["A".into(), "A".into(), " B ".into(), "".into()]);
        let blocks = build_blocks(&p, MarketingFramework::Aida);
        let features = blocks.iter().find(|b| b.block_type == BlockType::Features).unwrap();
        assert_eq!(features.bullets, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn blank_only_lists_do_not_emit_blocks() {
        let mut p = mug();
        p.use_cases = Some(vec![]);
        p.whats_included = Some(vec!["   ".into()]);
        let blocks = build_blocks(&p, MarketingFramework::Aida);
        assert!(blocks.iter().all(|b| b.block_type != BlockType::UseCases));
        assert!(blocks.iter().all(|b| b.block_type != BlockType::WhatsIncluded));
    }

    #[test]
    fn summary_phrasing_depends_on_benefit_count() {
        let mut p = mug();
        let summary = |p: &ProductInput| build_blocks(p, MarketingFramework::Aida)[1].body.clone();
        assert!(summary(&p).starts_with("Mug delivers"));

        p.key_benefits = Some(vec!["Keeps coffee hot".into()]);
        assert_eq!(summary(&p), "The standout benefit of Mug: Keeps coffee hot.");

        p.key_benefits = Some(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(summary(&p), "Top benefits include A, B and C.");
    }

    #[test]
    fn social_proof_quotes_first_two_reviews_without_bullets() {
        let mut p = mug();
        p.reviews = Some(vec![
            ProductReview { author: "Ana".into(), quote: "Love it".into() },
            ProductReview { author: "".into(), quote: "Great gift".into() },
            ProductReview { author: "Cy".into(), quote: "Third".into() },
        ]);
        let blocks = build_blocks(&p, MarketingFramework::Aida);
        let proof = blocks.iter().find(|b| b.block_type == BlockType::SocialProof).unwrap();
        assert_eq!(proof.body, "\u{201c}Love it\u{201d} \u{2014} Ana \u{201c}Great gift\u{201d} \u{2014} Verified customer");
        assert!(proof.bullets.is_none());
    }

    #[test]
    fn blank_review_quotes_still_count_toward_social_proof() {
        let mut p = mug();
        p.reviews = Some(vec![ProductReview { author: "Ana".into(), quote: "".into() }]);
        let blocks = build_blocks(&p, MarketingFramework::Aida);
        assert_eq!(types(&blocks), vec![BlockType::Hook, BlockType::Summary, BlockType::SocialProof, BlockType::Cta]);
        assert_eq!(blocks[2].body, "\u{201c}Highly recommended.\u{201d} \u{2014} Ana");

        p.reviews = Some(vec![
            ProductReview { author: "Ana".into(), quote: "  ".into() },
            ProductReview { author: "Bo".into(), quote: "Sturdy".into() },
            ProductReview { author: "Cy".into(), quote: "Third".into() },
        ]);
        let blocks = build_blocks(&p, MarketingFramework::Aida);
        let proof = blocks.iter().find(|b| b.block_type == BlockType::SocialProof).unwrap();
        assert!(proof.body.contains("Sturdy"));
        assert!(!proof.body.contains("Third"));
    }

    #[test]
    fn cta_states_price_and_carries_add_to_cart() {
        let blocks = build_blocks(&mug(), MarketingFramework::Pas);
        let cta = blocks.last().unwrap();
        assert!(cta.body.starts_with("Only $9.99."));
        let action = cta.call_to_action.as_ref().unwrap();
        assert_eq!(action.label, ADD_TO_CART_LABEL);
        assert!(action.description.is_some());

        let mut free = mug();
        free.price = 0.0;
        let blocks = build_blocks(&free, MarketingFramework::Pas);
        assert!(blocks.last().unwrap().body.starts_with("Great value."));
    }

    #[test]
    fn hook_targets_audience_when_present() {
        let mut p = mug();
        p.target_audience = Some("night owls".into());
        let blocks = build_blocks(&p, MarketingFramework::Bab);
        assert!(blocks[0].body.starts_with("Made for night owls"));
        assert_eq!(blocks[0].headline, hook_headline(MarketingFramework::Bab, "Mug"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let mut p = mug();
        p.features = Some(vec!["A".into(), "B".into()]);
        assert_eq!(build_blocks(&p, MarketingFramework::Fab), build_blocks(&p, MarketingFramework::Fab));
    }

    #[test]
    fn join_and_price_helpers() {
        assert_eq!(join_with_and(&["A".to_string()]), "A");
        assert_eq!(join_with_and(&["A".to_string(), "B".to_string()]), "A and B");
        assert_eq!(format_price(12.5), Some("$12.50".to_string()));
        assert_eq!(format_price(f64::NAN), None);
    }
}
