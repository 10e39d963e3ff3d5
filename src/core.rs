use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::chart::render_edit_history;
use crate::network::cache::RevisionCache;
use crate::network::revisions::RevisionFetcher;
use crate::network::session::Session;
use crate::utils::url::normalize_article_input;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_OUTPUT_DIR: &str = "plots";
pub const DEFAULT_LOG_BASE: f64 = 10.0;
pub const DEFAULT_MAX_RETRIES: usize = 2;
pub const DEFAULT_PACING_MS: u64 = 200;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT: u64 = 30;

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// Errors that can occur while fetching revisions or rendering the chart
///
/// Cache and transport failures are fatal; a response that lacks the
/// expected page container is handled inside the fetcher and never
/// surfaces here.
#[derive(Debug, Error)]
pub enum WikiplotError {
    /// Cache file exists but does not hold a JSON array of date strings
    #[error("cache file {path} is corrupt: {source}")]
    CacheCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Cache file could not be read or written
    #[error("cache I/O failure at {path}: {source}")]
    CacheIo { path: PathBuf, source: io::Error },

    /// Transport-level failure after the retry budget was spent
    #[error("remote API unavailable: {0}")]
    Remote(#[from] reqwest::Error),

    /// Remote answered with a status the retry policy does not cover
    #[error("remote API request failed with HTTP {0}")]
    RemoteStatus(reqwest::StatusCode),

    /// User input could not be turned into an article title
    #[error("invalid article input: {0:?}")]
    InvalidInput(String),

    /// Log base that cannot produce a usable axis (must be greater than 1)
    #[error("log base must be greater than 1: {0}")]
    InvalidLogBase(f64),

    /// Chart rendering or output file creation failed
    #[error("failed to render chart: {0}")]
    Chart(String),
}

/// Configuration options controlling fetching, caching, and rendering
///
/// Everything that used to be an implicit process-wide default (cache
/// directory, output directory, pacing) is an explicit field here.
#[derive(Clone, Debug)]
pub struct WikiplotOptions {
    pub api_url: String,
    pub cache_dir: PathBuf,
    pub log_base: f64,
    pub max_retries: usize,
    pub output_dir: PathBuf,
    pub pacing_ms: u64,
    pub retry_delay_ms: u64,
    pub silent: bool,
    pub timeout: u64,
    pub user_agent: Option<String>,
}

impl Default for WikiplotOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            log_base: DEFAULT_LOG_BASE,
            max_retries: DEFAULT_MAX_RETRIES,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pacing_ms: DEFAULT_PACING_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            silent: false,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

/// Result of one complete run: fetched history plus the saved chart
#[derive(Debug)]
pub struct ChartOutcome {
    pub title: String,
    pub dates: Vec<String>,
    pub new_count: usize,
    pub cache_written: bool,
    pub chart_path: PathBuf,
}

/// Fetches an article's edit history and renders it as a chart
///
/// Accepts either an article title or a full Wikipedia URL. The revision
/// cache is read before the network is touched and updated before the
/// chart is rendered, so a rendering failure never loses fetched data.
pub fn create_edit_history_chart(
    session: &mut Session,
    raw_input: &str,
) -> Result<ChartOutcome, WikiplotError> {
    let title = normalize_article_input(raw_input)
        .ok_or_else(|| WikiplotError::InvalidInput(raw_input.to_string()))?;

    let options = session.options().clone();
    // Rejected here as well so a bad base fails before any request goes out.
    if !(options.log_base > 1.0) {
        return Err(WikiplotError::InvalidLogBase(options.log_base));
    }
    let cache = RevisionCache::new(&options.cache_dir);

    if !options.silent {
        print_info_message(&format!("Fetching revisions for: {title}"));
    }

    let fetched = RevisionFetcher::new(session, &cache, options.silent).fetch(&title)?;

    let chart_path = render_edit_history(&fetched.dates, &title, raw_input, &options)?;

    if !options.silent {
        print_info_message(&format!("Plot saved as: {}", chart_path.display()));
    }

    Ok(ChartOutcome {
        title,
        dates: fetched.dates,
        new_count: fetched.new_count,
        cache_written: fetched.cache_written,
        chart_path,
    })
}

/// Prints an error message to stderr, in red when attached to a terminal
pub fn print_error_message(msg: &str) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}
