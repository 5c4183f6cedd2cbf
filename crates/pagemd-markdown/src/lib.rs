//! HTML to Markdown conversion for rendered web pages.
//!
//! This crate turns a fully rendered HTML document into a structured
//! Markdown document suitable for crawlers and LLM ingestion:
//!
//! - **Metadata extraction**: title, meta tags (basic, OpenGraph, Article,
//!   Twitter, robots), canonical link and document language, collected in a
//!   single DOM pass and rendered as YAML frontmatter
//! - **Structured data**: JSON-LD script blocks re-emitted as fenced `json`
//!   code blocks
//! - **Sanitization**: best-effort removal of configured DOM selectors
//!   (navigation, footers, opt-out markers) before conversion
//! - **Conversion**: ATX headings, inline links and images, pipe tables,
//!   fenced code blocks and `-` bullet lists
//! - **Post-processing**: caller-supplied Markdown transformers and an
//!   optional size-statistics debug comment

pub mod converter;
pub mod error;
pub mod metadata;
pub mod node;
pub mod options;
pub mod parser;
pub mod sanitize;

pub use error::ConvertError;
pub use metadata::{PageMetadata, extract_metadata};
pub use options::{ConvertOptions, Transformer};
pub use sanitize::clean_html;

/// Converts a rendered HTML document to Markdown.
///
/// Metadata and JSON-LD are extracted from the original document before
/// sanitization, so frontmatter reflects `<head>` content even when cleanup
/// selectors target it. The sanitized body is then converted, transformers
/// are applied in order, and the final document is assembled as
/// frontmatter, body and structured-data section. The debug comment, when
/// enabled, is computed last over the fully assembled output.
pub fn html_to_markdown(html: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    if html.trim().is_empty() {
        return Ok(String::new());
    }

    let (metadata, structured_data) = extract_metadata(html);
    let cleaned = clean_html(html, &options.clean_selectors);
    let nodes = parser::parse_body(&cleaned);

    let mut body = converter::convert_nodes_to_markdown(&nodes)?;
    for transformer in &options.transformers {
        body = transformer(body);
    }

    let mut output = String::new();
    if options.include_frontmatter
        && let Some(frontmatter) = metadata.to_frontmatter()
    {
        output.push_str(&frontmatter);
        output.push_str("\n\n");
    }
    output.push_str(&body);

    if !structured_data.is_empty() {
        output.push_str("\n\n## Structured Data (JSON-LD)\n");
        for block in &structured_data {
            output.push_str("\n```json\n");
            output.push_str(block);
            output.push_str("\n```\n");
        }
    }

    if options.debug {
        let html_bytes = options.html_size.unwrap_or(html.len());
        let markdown_bytes = output.trim().len();
        let reduction = if html_bytes > 0 {
            (((html_bytes as f64 - markdown_bytes as f64) / html_bytes as f64) * 100.0).round()
                as i64
        } else {
            0
        };
        output = format!(
            "<!-- pagemd: html_size={} bytes, markdown_size={} bytes, reduction={}% -->\n\n{}",
            html_bytes, markdown_bytes, reduction, output
        );
    }

    Ok(output.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const PAGE: &str = concat!(
        "<html lang=\"en\"><head>",
        "<title>My Page</title>",
        "<meta name=\"description\" content=\"Page description\">",
        "</head><body>",
        "<nav>site menu</nav>",
        "<h1>Content</h1>",
        "<p>Hello <a href=\"/about\">About</a></p>",
        "</body></html>",
    );

    #[test]
    fn test_frontmatter_and_body() {
        let markdown = html_to_markdown(PAGE, &ConvertOptions::default()).unwrap();
        assert!(markdown.starts_with("---\n"));
        assert!(markdown.contains("title: \"My Page\""));
        assert!(markdown.contains("description: \"Page description\""));
        assert!(markdown.contains("language: \"en\""));
        assert!(markdown.contains("# Content"));
        assert!(markdown.contains("[About](/about)"));
        // Default selectors removed the navigation.
        assert!(!markdown.contains("site menu"));
    }

    #[test]
    fn test_frontmatter_disabled() {
        let options = ConvertOptions {
            include_frontmatter: false,
            ..Default::default()
        };
        let markdown = html_to_markdown(PAGE, &options).unwrap();
        assert!(markdown.starts_with("# Content"));
    }

    #[test]
    fn test_transformers_applied_in_order() {
        let options = ConvertOptions {
            include_frontmatter: false,
            transformers: vec![
                Arc::new(|md: String| md.replace("Content", "Step1")) as Transformer,
                Arc::new(|md: String| md.replace("Step1", "Step2")) as Transformer,
            ],
            ..Default::default()
        };
        let markdown = html_to_markdown(PAGE, &options).unwrap();
        assert!(markdown.contains("# Step2"));
    }

    #[test]
    fn test_structured_data_section() {
        let html = concat!(
            "<html><head>",
            "<script type=\"application/ld+json\">{\"@type\":\"Thing\"}</script>",
            "<script type=\"application/ld+json\">not json</script>",
            "</head><body><h1>X</h1></body></html>",
        );
        let markdown = html_to_markdown(html, &ConvertOptions::default()).unwrap();
        assert!(markdown.contains("## Structured Data (JSON-LD)"));
        assert_eq!(markdown.matches("```json").count(), 1);
        assert!(markdown.contains("\"@type\": \"Thing\""));
    }

    #[test]
    fn test_debug_comment_first_line() {
        let options = ConvertOptions {
            debug: true,
            ..Default::default()
        };
        let markdown = html_to_markdown(PAGE, &options).unwrap();
        let first_line = markdown.lines().next().unwrap();
        assert!(first_line.starts_with("<!-- pagemd: html_size="));
        assert!(first_line.contains("markdown_size="));
        assert!(first_line.contains("reduction="));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            html_to_markdown("  \n ", &ConvertOptions::default()).unwrap(),
            ""
        );
    }
}
