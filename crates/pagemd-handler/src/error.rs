use miette::Diagnostic;
use pagemd_markdown::ConvertError;
use thiserror::Error;

/// Errors surfaced by the rendering pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("path \"{path}\" is excluded by the path filter")]
    #[diagnostic(
        code(pagemd_handler::path_excluded),
        help("adjust the include/exclude globs if this path should be rendered")
    )]
    PathExcluded { path: String },

    #[error("origin returned HTTP status {status}")]
    #[diagnostic(code(pagemd_handler::origin_http_error))]
    OriginHttpError { status: u16 },

    #[error("no origin could be reached")]
    #[diagnostic(
        code(pagemd_handler::origin_unreachable),
        help("check that the origin (and fallback origin, if any) is up and resolvable")
    )]
    OriginUnreachable {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client")]
    #[diagnostic(code(pagemd_handler::client))]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Convert(#[from] ConvertError),
}
