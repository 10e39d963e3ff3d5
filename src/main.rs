use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use wikiplot::core::{
    create_edit_history_chart, print_error_message, WikiplotOptions, DEFAULT_API_URL,
    DEFAULT_CACHE_DIR, DEFAULT_LOG_BASE, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_DIR,
    DEFAULT_PACING_MS, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT,
};
use wikiplot::network::session::Session;

#[derive(Parser)]
#[command(
    name = "wikiplot",
    version,
    about = "Chart the edit history of a Wikipedia article"
)]
struct Cli {
    /// Wikipedia article title or URL; prompts interactively when omitted
    input: Option<String>,

    /// Logarithmic base for the y axis
    #[arg(long, default_value_t = DEFAULT_LOG_BASE)]
    log_base: f64,

    /// Directory holding the per-article revision caches
    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    /// Directory where charts are written
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// MediaWiki API endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// HTTP request timeout in seconds, 0 for no timeout
    #[arg(long, default_value_t = DEFAULT_TIMEOUT)]
    timeout: u64,

    /// Retries per request on transient failures
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: usize,

    /// Delay in milliseconds before the first retry, doubled per attempt
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    /// Pause in milliseconds between consecutive API requests
    #[arg(long, default_value_t = DEFAULT_PACING_MS)]
    pacing_ms: u64,

    /// Custom User-Agent string
    #[arg(long)]
    user_agent: Option<String>,

    /// Suppress progress output
    #[arg(short, long)]
    silent: bool,
}

fn main() {
    let cli = Cli::parse();

    let raw_input = match cli.input.clone().or_else(prompt_for_input) {
        Some(input) => input,
        None => {
            print_error_message("No article title or URL given");
            process::exit(1);
        }
    };

    let options = WikiplotOptions {
        api_url: cli.api_url,
        cache_dir: cli.cache_dir,
        log_base: cli.log_base,
        max_retries: cli.max_retries,
        output_dir: cli.output_dir,
        pacing_ms: cli.pacing_ms,
        retry_delay_ms: cli.retry_delay_ms,
        silent: cli.silent,
        timeout: cli.timeout,
        user_agent: cli.user_agent,
    };

    let mut session = match Session::new(options) {
        Ok(session) => session,
        Err(e) => {
            print_error_message(&e.to_string());
            process::exit(1);
        }
    };

    if let Err(e) = create_edit_history_chart(&mut session, &raw_input) {
        print_error_message(&e.to_string());
        process::exit(1);
    }
}

fn prompt_for_input() -> Option<String> {
    print!("Enter Wikipedia page title or URL: ");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line).ok()?;

    let line = line.trim().to_string();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}
