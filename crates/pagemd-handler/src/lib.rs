//! Fetch-and-render pipeline turning origin pages into cached Markdown.
//!
//! Given a page path, the handler decides whether the path is eligible
//! (glob include/exclude filtering), fetches rendered HTML from a primary
//! origin with optional fallback, converts it to Markdown with
//! [`pagemd_markdown`], and caches the result with TTL and build-id
//! invalidation.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod renderer;

pub use cache::MarkdownCache;
pub use config::{Config, PartialConfig};
pub use error::RenderError;
pub use fetch::{FetchedPage, PageFetcher};
pub use renderer::PageRenderer;
