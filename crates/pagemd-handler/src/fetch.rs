//! Origin fetching with primary/fallback failover.

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue};

use crate::error::RenderError;

/// A successfully fetched page: the rendered HTML plus any cache lifetime
/// the origin advertised.
#[derive(Debug)]
pub struct FetchedPage {
    pub html: String,
    /// TTL in seconds, taken from `x-revalidate` or `Cache-Control`.
    pub revalidate_seconds: Option<u64>,
}

/// Outcome of a single origin attempt that did not yield a usable page.
enum AttemptError {
    /// The origin answered with a non-success status.
    Status(u16),
    /// The request never produced a response.
    Transport(reqwest::Error),
}

/// HTTP fetcher for rendered pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: ReqwestClient,
}

impl PageFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, RenderError> {
        let client = ReqwestClient::builder()
            .user_agent(format!("pagemd/{}", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|source| RenderError::Client { source })?;
        Ok(Self { client })
    }

    /// Fetches `path` from the primary origin, falling back to the fallback
    /// origin when the primary fails. A status failure on any attempt takes
    /// precedence over transport failures when reporting the error, and the
    /// most recent failure of each kind wins.
    pub async fn fetch_html(
        &self,
        primary_origin: &str,
        fallback_origin: Option<&str>,
        path: &str,
        forward_headers: &[(String, String)],
    ) -> Result<FetchedPage, RenderError> {
        let mut last_status: Option<u16> = None;
        let mut last_transport: Option<reqwest::Error> = None;

        let mut origins = vec![primary_origin];
        if let Some(fallback) = fallback_origin
            && fallback.trim_end_matches('/') != primary_origin.trim_end_matches('/')
        {
            origins.push(fallback);
        }

        for origin in origins {
            let url = format!("{}{}", origin.trim_end_matches('/'), path);
            match self.attempt(&url, forward_headers).await {
                Ok(page) => return Ok(page),
                Err(AttemptError::Status(status)) => {
                    tracing::warn!("origin {} returned status {}", url, status);
                    last_status = Some(status);
                }
                Err(AttemptError::Transport(e)) => {
                    tracing::warn!("origin {} unreachable: {}", url, e);
                    last_transport = Some(e);
                }
            }
        }

        match (last_status, last_transport) {
            (Some(status), _) => Err(RenderError::OriginHttpError { status }),
            (None, Some(source)) => Err(RenderError::OriginUnreachable { source }),
            // At least one origin was attempted, so one of the above holds.
            (None, None) => unreachable!("fetch attempted with no origins"),
        }
    }

    async fn attempt(
        &self,
        url: &str,
        forward_headers: &[(String, String)],
    ) -> Result<FetchedPage, AttemptError> {
        let mut headers = HeaderMap::new();
        for (name, value) in forward_headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        // The origin must render HTML, whatever Accept the caller forwarded.
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(AttemptError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let revalidate = revalidate_seconds(response.headers());
        let html = response.text().await.map_err(AttemptError::Transport)?;
        Ok(FetchedPage {
            html,
            revalidate_seconds: revalidate,
        })
    }
}

/// Extracts the advertised cache lifetime from response headers. The
/// `x-revalidate` header wins over `Cache-Control`; within `Cache-Control`,
/// `s-maxage` wins over `revalidate`.
pub fn revalidate_seconds(headers: &HeaderMap) -> Option<u64> {
    if let Some(value) = headers.get("x-revalidate")
        && let Ok(text) = value.to_str()
        && let Ok(seconds) = text.trim().parse()
        && seconds > 0
    {
        return Some(seconds);
    }

    let cache_control = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    let directive_value = |name: &str| {
        cache_control.split(',').find_map(|directive| {
            let directive = directive.trim();
            directive
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
                .and_then(|value| value.trim().parse::<u64>().ok())
        })
    };
    directive_value("s-maxage").or_else(|| directive_value("revalidate"))
}
