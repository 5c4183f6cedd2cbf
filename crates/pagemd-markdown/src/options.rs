use std::sync::Arc;

/// A post-conversion transform applied to the Markdown body. Transforms
/// must be pure with respect to their input so that cached output stays
/// consistent across recomputations.
pub type Transformer = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Options controlling HTML to Markdown conversion and document assembly.
pub struct ConvertOptions {
    /// DOM selectors removed from the document before conversion.
    pub clean_selectors: Vec<String>,
    /// Applied in order to the converted body, each receiving the full
    /// Markdown string.
    pub transformers: Vec<Transformer>,
    /// Prepend a YAML frontmatter block built from extracted metadata.
    pub include_frontmatter: bool,
    /// Prepend an HTML comment with input/output size statistics.
    pub debug: bool,
    /// Byte size of the source HTML, if already known by the caller.
    /// Computed from the input when absent.
    pub html_size: Option<usize>,
}

/// Selectors removed by default: navigation, footers, the explicit opt-out
/// markers, and scripts/styles.
pub fn default_clean_selectors() -> Vec<String> {
    ["nav", "footer", ".no-markdown", "[data-no-markdown]", "script", "style"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            clean_selectors: default_clean_selectors(),
            transformers: Vec::new(),
            include_frontmatter: true,
            debug: false,
            html_size: None,
        }
    }
}
