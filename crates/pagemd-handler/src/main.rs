use clap::Parser;
use pagemd_handler::{MarkdownCache, PageRenderer, PartialConfig};
use url::Url;

/// Fetches a rendered page from an origin and prints it as Markdown.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Origin to fetch from, e.g. https://example.com.
    #[clap(required = true)]
    origin: Url,
    /// Page path to render, e.g. /docs/intro.
    #[clap(required = true)]
    path: String,
    /// Origin tried when the primary origin fails.
    #[clap(long)]
    fallback_origin: Option<Url>,
    /// Request timeout in seconds.
    #[clap(short, long, default_value_t = 30)]
    timeout: u64,
    /// Disable the Markdown cache.
    #[clap(long)]
    no_cache: bool,
    /// Omit the YAML frontmatter block.
    #[clap(long)]
    no_frontmatter: bool,
    /// Prepend a size-statistics comment to the output.
    #[clap(short, long)]
    debug: bool,
    /// Header forwarded to the origin, as NAME:VALUE. May be repeated.
    #[clap(short = 'H', long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,
    /// Build identifier for cache invalidation. Defaults to the BUILD_ID
    /// environment variable.
    #[clap(long)]
    build_id: Option<String>,
    /// Path to a JSON configuration file.
    #[clap(short, long)]
    config: Option<String>,
}

fn load_config(args: &CliArgs) -> Result<pagemd_handler::Config, String> {
    let partial = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read config file {}: {}", path, e))?;
            serde_json::from_str::<PartialConfig>(&text)
                .map_err(|e| format!("invalid config file {}: {}", path, e))?
        }
        None => PartialConfig::default(),
    };
    let mut config = partial.into_config();
    if args.no_cache {
        config.cache = false;
    }
    if args.no_frontmatter {
        config.include_frontmatter = false;
    }
    if args.debug {
        config.debug = true;
    }
    Ok(config)
}

fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| format!("invalid header \"{}\", expected NAME:VALUE", header))
        })
        .collect()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let forward_headers = match parse_headers(&args.headers) {
        Ok(headers) => headers,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let renderer = match PageRenderer::new(config, args.origin.as_str(), args.timeout) {
        Ok(renderer) => renderer,
        Err(e) => {
            tracing::error!("failed to initialize renderer: {}", e);
            std::process::exit(1);
        }
    };
    let mut renderer = renderer.with_forward_headers(forward_headers);
    if let Some(fallback) = &args.fallback_origin {
        renderer = renderer.with_fallback_origin(fallback.as_str());
    }
    let build_id = args
        .build_id
        .clone()
        .or_else(|| std::env::var("BUILD_ID").ok());
    if let Some(build_id) = build_id {
        renderer = renderer.with_build_id(build_id);
    }

    let cache = MarkdownCache::new();
    match renderer.render(&args.path, &cache).await {
        Ok(markdown) => println!("{}", markdown),
        Err(e) => {
            tracing::error!("failed to render {}: {}", args.path, e);
            std::process::exit(1);
        }
    }
}
