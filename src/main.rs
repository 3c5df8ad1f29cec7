//! Replays the HTTP requests captured in a Rails log against another host, keeping their
//! original pace.
//!
//! ```bash
//! request-log-replayer -H staging.example.com -l production.log
//! request-log-replayer -H staging.example.com -l production.log -c 4 -s 2.0 -o 100 -r 500
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use request_log_replayer::{
    configuration::IPHONE_USER_AGENT, ReplayConfiguration, RequestLogReplayer,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Simulate HTTP requests according to a Rails request log")]
struct Cli {
    /// Host server to send requests to
    #[arg(short = 'H', long)]
    host: String,

    /// Rails log file that includes the captured HTTP requests
    #[arg(short, long)]
    log: PathBuf,

    /// Number of times every request is replayed
    #[arg(short, long, default_value_t = 1)]
    concurrency: usize,

    /// Ratio of request intervals according to realtime
    #[arg(short, long, default_value_t = 1.0)]
    speed: f64,

    /// Number of total requests to replay
    #[arg(short = 'r', long = "request")]
    request: Option<usize>,

    /// Number of requests to start from
    #[arg(short, long, default_value_t = 0)]
    offset: usize,

    /// Log every redirect and response
    #[arg(short, long)]
    verbose: bool,

    /// Identify as an iPhone instead of an Android phone
    #[arg(long)]
    iphone: bool,
}

impl Cli {
    fn replay_configuration(&self) -> ReplayConfiguration {
        let mut configuration = ReplayConfiguration::new(self.host.as_str());
        configuration.set_concurrency(self.concurrency);
        configuration.set_speed(self.speed);
        configuration.set_offset(self.offset);
        configuration.set_count(self.request);
        if self.iphone {
            configuration.set_user_agent(IPHONE_USER_AGENT);
        }
        configuration
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let replayer =
        RequestLogReplayer::new(cli.replay_configuration()).context("Invalid replay options")?;

    let blocks = replayer
        .load_blocks(&cli.log)
        .with_context(|| format!("Couldn't read {}", cli.log.display()))?;
    let requests = replayer
        .parse_log(&blocks)
        .context("Couldn't parse the captured requests")?;
    info!(
        "Parsed {} requests out of {} log blocks",
        requests.len(),
        blocks.len()
    );

    let run = replayer
        .replay_requests(&requests)
        .context("Couldn't schedule the replay")?;
    run.wait().await;

    Ok(())
}
