//! The rendering pipeline: filter, cache lookup, fetch, convert, store.

use pagemd_markdown::{ConvertOptions, html_to_markdown};

use crate::cache::MarkdownCache;
use crate::config::Config;
use crate::error::RenderError;
use crate::fetch::PageFetcher;
use crate::filter::{is_excluded, normalize_path};

/// Renders pages from an origin to Markdown.
///
/// Conversion options are derived from the configuration once at
/// construction and reused for every render.
pub struct PageRenderer {
    config: Config,
    convert_options: ConvertOptions,
    fetcher: PageFetcher,
    primary_origin: String,
    fallback_origin: Option<String>,
    forward_headers: Vec<(String, String)>,
    build_id: Option<String>,
}

impl PageRenderer {
    pub fn new(
        config: Config,
        primary_origin: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, RenderError> {
        let convert_options = ConvertOptions {
            clean_selectors: config.clean_selectors.clone(),
            transformers: config.transformers.clone(),
            include_frontmatter: config.include_frontmatter,
            debug: config.debug,
            html_size: None,
        };
        Ok(Self {
            config,
            convert_options,
            fetcher: PageFetcher::new(timeout_secs)?,
            primary_origin: primary_origin.into(),
            fallback_origin: None,
            forward_headers: Vec::new(),
            build_id: None,
        })
    }

    /// Origin tried when the primary origin fails.
    pub fn with_fallback_origin(mut self, origin: impl Into<String>) -> Self {
        self.fallback_origin = Some(origin.into());
        self
    }

    /// Request headers forwarded to the origin on every fetch.
    pub fn with_forward_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.forward_headers = headers;
        self
    }

    /// Deployment build identifier; cached entries from other builds are
    /// discarded.
    pub fn with_build_id(mut self, build_id: impl Into<String>) -> Self {
        self.build_id = Some(build_id.into());
        self
    }

    /// Renders the page at `path` to Markdown, consulting and updating the
    /// cache when caching is enabled.
    pub async fn render(
        &self,
        path: &str,
        cache: &MarkdownCache,
    ) -> Result<String, RenderError> {
        let path = normalize_path(path);
        if is_excluded(&path, &self.config.include, &self.config.exclude) {
            return Err(RenderError::PathExcluded { path });
        }

        if self.config.cache
            && let Some(markdown) = cache.get(&path, self.build_id.as_deref())
        {
            tracing::debug!("cache hit for {}", path);
            return Ok(markdown);
        }

        tracing::debug!("rendering {} from origin", path);
        let page = self
            .fetcher
            .fetch_html(
                &self.primary_origin,
                self.fallback_origin.as_deref(),
                &path,
                &self.forward_headers,
            )
            .await?;

        let markdown = html_to_markdown(&page.html, &self.convert_options)?;

        if self.config.cache {
            cache.put(
                &path,
                markdown.clone(),
                page.revalidate_seconds,
                self.build_id.as_deref(),
            );
        }
        Ok(markdown)
    }
}
