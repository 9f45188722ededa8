use ammonia::Builder;
use html_escape::encode_text;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There is no content to export.")]
    Empty,
}

/// Allow-list sanitizer over ammonia's default HTML profile. Scripts, styles,
/// embeds, event handlers and non-http(s) URLs are dropped; the page markup
/// keeps its `section` wrappers plus `class` and `id` hooks.
pub fn sanitize_html(raw: &str) -> String {
    Builder::default()
        .add_tags(&["section"])
        .add_generic_attributes(&["class", "id"])
        .link_rel(None)
        .clean(raw)
        .to_string()
}

/// Standalone downloadable document around a sanitized fragment.
pub fn export_document(title: &str, content: &str) -> Result<String, ExportError> {
    let body = sanitize_html(content);
    if body.trim().is_empty() {
        return Err(ExportError::Empty);
    }
    let title = if title.trim().is_empty() { "Product Page" } else { title.trim() };
    Ok(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\" />\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n  <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        encode_text(title),
        body.trim()
    ))
}

/// `{slug}-page.html`, `product-page.html` when the title has no usable characters.
pub fn export_filename(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "product".to_string() } else { slug };
    format!("{slug}-page.html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_executable_content() {
        let dirty = r#"<section><h2>Hi</h2><script>alert(1)</script><STYLE>body{}</STYLE><p onclick="x()" style="color:red">Body</p><a href="javascript:alert(1)">x</a><iframe src="//evil"></iframe><link rel="stylesheet" href="x.css"></section>"#;
        let clean = sanitize_html(dirty);
        assert!(clean.contains("<h2>Hi</h2>"));
        assert!(clean.contains("<p>Body</p>"));
        for needle in ["script", "alert", "onclick", "style", "iframe", "<link", "javascript"] {
            assert!(!clean.contains(needle), "{needle} survived in {clean}");
        }
    }

    #[test]
    fn strips_handlers_without_leading_whitespace() {
        let clean = sanitize_html("<img/onerror=alert(1) src=x>");
        assert!(!clean.contains("onerror"));
        assert!(!clean.contains("alert"));
        assert!(clean.contains(r#"src="x""#));
    }

    #[test]
    fn strips_entity_encoded_script_urls() {
        let clean = sanitize_html(r#"<a href="java&#x73;cript:alert(1)">x</a>"#);
        assert!(!clean.contains("href"));
        assert!(!clean.contains("cript:"));
        assert!(clean.contains(">x</a>"));
    }

    #[test]
    fn nested_script_fragments_never_yield_a_script_tag() {
        for dirty in ["<p>a</p><script src=x.js>", "<scr<script></script>ipt>alert(1)</script>"] {
            assert!(!sanitize_html(dirty).to_lowercase().contains("<script"));
        }
    }

    #[test]
    fn keeps_page_markup() {
        let clean = r#"<article class="product-page"><section class="product-block product-block--hook" id="hook-0"><h1>Mug</h1><ul><li>A &amp; B</li></ul></section></article>"#;
        assert_eq!(sanitize_html(clean), clean);
    }

    #[test]
    fn export_wraps_sanitized_fragment() {
        let doc = export_document("Mug <deluxe>", "<p>Hi</p><script>x</script>").unwrap();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Mug &lt;deluxe&gt;</title>"));
        assert!(doc.contains("<body>\n<p>Hi</p>\n</body>"));
        assert!(!doc.contains("<script>"));
    }

    #[test]
    fn export_rejects_empty_content() {
        assert!(matches!(export_document("t", "  <script>x</script> "), Err(ExportError::Empty)));
    }

    #[test]
    fn filename_is_slugged() {
        assert_eq!(export_filename("Ceramic Mug (12oz)"), "ceramic-mug-12oz-page.html");
        assert_eq!(export_filename("   "), "product-page.html");
    }
}
