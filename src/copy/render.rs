use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::copy::blocks::format_price;
use crate::models::{GeneratedBlock, ProductInput};

const CLOSING_CTA: &str = "Order now and experience the difference for yourself.";

/// Renders the product page as one HTML fragment. Field values are escaped,
/// so the output carries no markup beyond the fixed page skeleton.
pub fn render_document(product: &ProductInput, blocks: &[GeneratedBlock]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(blocks.len() * 8 + 12);

    lines.push(r#"<article class="product-page">"#.to_string());
    lines.push(r#"  <header class="product-page__header">"#.to_string());
    lines.push(format!("    <h1>{}</h1>", text(product.title.trim())));
    lines.push(format!(r#"    <p class="product-page__description">{}</p>"#, text(product.description.trim())));
    if let Some(audience) = product.audience() {
        lines.push(format!(r#"    <p class="product-page__audience">Designed for {}</p>"#, text(audience)));
    }
    lines.push(format!(r#"    <p class="product-page__meta">{}</p>"#, text(&meta_line(product))));
    lines.push("  </header>".to_string());

    for block in blocks {
        render_block(&mut lines, block);
    }

    let price = format_price(product.price).unwrap_or_else(|| "Great value".to_string());
    lines.push(r#"  <footer class="product-page__footer">"#.to_string());
    lines.push(format!(r#"    <p class="product-page__price">Price: {}</p>"#, text(&price)));
    lines.push(format!(r#"    <p class="product-page__closing">{CLOSING_CTA}</p>"#));
    lines.push("  </footer>".to_string());
    lines.push("</article>".to_string());

    lines.join("\n")
}

fn render_block(lines: &mut Vec<String>, block: &GeneratedBlock) {
    lines.push(format!(
        r#"  <section class="product-block product-block--{}" id="{}">"#,
        block.block_type.as_str(),
        attr(&block.id)
    ));
    lines.push(format!("    <h2>{}</h2>", text(&block.title)));
    lines.push(format!("    <h3>{}</h3>", text(&block.headline)));
    lines.push(format!("    <p>{}</p>", text(&block.body)));

    if let Some(bullets) = block.bullets.as_ref().filter(|b| !b.is_empty()) {
        lines.push("    <ul>".to_string());
        lines.extend(bullets.iter().map(|item| format!("      <li>{}</li>", text(item))));
        lines.push("    </ul>".to_string());
    }

    if let Some(cta) = &block.call_to_action {
        lines.push(r#"    <div class="product-block__cta">"#.to_string());
        lines.push(format!("      <strong>{}</strong>", text(&cta.label)));
        if let Some(description) = &cta.description {
            lines.push(format!("      <p>{}</p>", text(description)));
        }
        lines.push("    </div>".to_string());
    }

    lines.push("  </section>".to_string());
}

fn meta_line(product: &ProductInput) -> String {
    let keywords: Vec<&str> = [product.primary_keyword(), product.secondary_keyword()]
        .into_iter()
        .flatten()
        .collect();
    if keywords.is_empty() {
        format!("Tone: {}", product.tone())
    } else {
        format!("Tone: {} | Keywords: {}", product.tone(), keywords.join(", "))
    }
}
