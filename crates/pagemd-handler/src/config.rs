use pagemd_markdown::Transformer;
use pagemd_markdown::options::default_clean_selectors;
use serde::Deserialize;

/// Fully resolved handler configuration. Every field is populated; partial
/// caller input is merged over [`Config::default`] before the engine runs.
pub struct Config {
    /// Paths must match at least one of these globs (when non-empty).
    pub include: Vec<String>,
    /// Paths matching any of these globs are rejected.
    pub exclude: Vec<String>,
    /// DOM selectors removed before conversion.
    pub clean_selectors: Vec<String>,
    /// Store and reuse rendered Markdown.
    pub cache: bool,
    /// Markdown post-processing, applied in order.
    pub transformers: Vec<Transformer>,
    /// Prepend extracted metadata as YAML frontmatter.
    pub include_frontmatter: bool,
    /// Prepend a size-statistics comment to the output.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            include: vec!["/**".to_string()],
            exclude: vec!["/api/**".to_string()],
            clean_selectors: default_clean_selectors(),
            cache: true,
            transformers: Vec::new(),
            include_frontmatter: true,
            debug: false,
        }
    }
}

/// Caller-supplied configuration with every field optional, typically
/// deserialized from a JSON config file. Transformers are code and can only
/// be attached to the resolved [`Config`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialConfig {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub clean_selectors: Option<Vec<String>>,
    pub cache: Option<bool>,
    pub include_frontmatter: Option<bool>,
    pub debug: Option<bool>,
}

impl PartialConfig {
    /// Merges this partial configuration over the defaults, field by field.
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            include: self.include.unwrap_or(defaults.include),
            exclude: self.exclude.unwrap_or(defaults.exclude),
            clean_selectors: self.clean_selectors.unwrap_or(defaults.clean_selectors),
            cache: self.cache.unwrap_or(defaults.cache),
            transformers: defaults.transformers,
            include_frontmatter: self
                .include_frontmatter
                .unwrap_or(defaults.include_frontmatter),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }
}
