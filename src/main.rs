//! A3S Dork CLI - dork search through a rotating proxy pool.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use a3s_dork::{
    scheduler::{Jitter, DEFAULT_CONCURRENCY},
    validator::DEFAULT_VALIDATION_CONCURRENCY,
    DorkSearch, Engine, RunConfig,
};

/// A3S Dork - search engine dorking through validated proxies
#[derive(Parser)]
#[command(name = "a3s-dork")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File with one dork per line
    #[arg(short, long, required_unless_present = "list_engines")]
    dorks: Option<PathBuf>,

    /// File with one proxy per line ([user:pass@]host:port)
    #[arg(short = 'x', long, default_value = "proxy.txt")]
    proxies: PathBuf,

    /// File the discovered domains are appended to
    #[arg(short, long, default_value = "results.txt")]
    output: PathBuf,

    /// Search engines to use (comma-separated)
    /// Available: google, bing, duckduckgo
    #[arg(short, long, default_value = "google")]
    engines: String,

    /// Result pages fetched per dork and engine
    #[arg(short, long, default_value = "1")]
    pages: u32,

    /// Maximum number of concurrent searches
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    threads: usize,

    /// Retries per search after the first attempt
    #[arg(short, long, default_value = "3")]
    retries: u32,

    /// Maximum number of proxies validated at once
    #[arg(long, default_value_t = DEFAULT_VALIDATION_CONCURRENCY)]
    validate_threads: usize,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Skip the random pause after each search
    #[arg(long)]
    no_jitter: bool,

    /// Summary format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// List available search engines and exit
    #[arg(long)]
    list_engines: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    if cli.list_engines {
        list_engines();
        return Ok(());
    }

    run_dorks(cli).await
}

fn list_engines() {
    println!("Available search engines:\n");
    for engine in Engine::ALL {
        println!("  {:<12} {}", engine.name(), engine.base_url());
    }
    println!();
    println!("Usage: a3s-dork -d dorks.txt -e google,bing -p 2");
}

async fn run_dorks(cli: Cli) -> Result<()> {
    let dorks = cli
        .dorks
        .ok_or_else(|| anyhow::anyhow!("A dork file is required"))?;

    let mut config = RunConfig::new(dorks)
        .with_proxy_file(cli.proxies)
        .with_output(cli.output)
        .with_engines(Engine::parse_list(&cli.engines))
        .with_pages(cli.pages)
        .with_concurrency(cli.threads)
        .with_max_retries(cli.retries)
        .with_validation_concurrency(cli.validate_threads)
        .with_timeout(Duration::from_secs(cli.timeout));
    if cli.no_jitter {
        config = config.with_jitter(Jitter::none());
    }

    let summary = DorkSearch::new(config).run().await?;

    match cli.format {
        OutputFormat::Text => println!("\n{}", summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
