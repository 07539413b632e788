use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storescout_common::{Concurrency, ScrapeConfig, DETAIL_POOL_SIZE, SITE_POOL_SIZE};
use storescout_fetch::{FetchClient, FetchConfig};
use storescout_pipeline::Pipeline;

/// Scrape a shop directory, enrich each shop from its storefront site and
/// social profile, and emit the merged records as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "storescout")]
struct Args {
    /// Number of shops to scrape.
    #[arg(long, default_value_t = 30)]
    shops: usize,

    /// Fetch directory detail pages through a worker pool instead of
    /// sequentially. Risks rate limiting by the directory host.
    #[arg(long)]
    concurrent_details: bool,

    /// Fetch social profiles through a worker pool instead of
    /// sequentially. Risks blocking by the platform.
    #[arg(long)]
    concurrent_profiles: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Attempts per URL before giving up.
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Skip TLS verification (debugging through intercepting proxies only).
    #[arg(long)]
    no_verify: bool,

    /// Proxy URLs to rotate through, comma separated.
    #[arg(long, value_delimiter = ',')]
    proxy: Vec<String>,

    /// Write JSON-lines output here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("storescout_pipeline=info".parse()?)
                .add_directive("storescout_fetch=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = ScrapeConfig::from_env();
    if args.concurrent_details {
        config.detail_concurrency = Concurrency::Pool(DETAIL_POOL_SIZE);
    }
    if args.concurrent_profiles {
        config.profile_concurrency = Concurrency::Pool(SITE_POOL_SIZE);
    }

    let fetcher = Arc::new(FetchClient::new(FetchConfig {
        timeout: Duration::from_secs(args.timeout),
        max_retries: args.max_retries,
        verify_tls: !args.no_verify,
        proxies: args.proxy,
        ..FetchConfig::default()
    }));

    info!(shops = args.shops, root = config.directory_root.as_str(), "storescout starting");

    let pipeline = Pipeline::new(fetcher, config);
    let output = pipeline.run(args.shops).await?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    for record in &output.records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;

    // Stats go to stderr so piped stdout stays clean JSON.
    eprintln!("{}", output.stats);
    Ok(())
}
