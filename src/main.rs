use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use holiday_sprites::sprites::batch;
use holiday_sprites::{logging, read_holidays, Resolver, SpriteConfig};

/// Produce a 32x32 sprite for every holiday in the holiday file.
///
/// Exits 0 when every sprite resolved, 1 when some sprites failed, and 2
/// when the run could not start.
#[derive(Debug, Parser)]
#[command(name = "holiday-sprites", version)]
struct Args {
    /// Holiday file written by scrape-holidays.
    #[arg(long, default_value = "events/holidays.json")]
    holidays: PathBuf,

    /// TOML config; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    custom_dir: Option<PathBuf>,

    #[arg(long)]
    auto_dir: Option<PathBuf>,

    #[arg(long)]
    fallback: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Delete every previously downloaded sprite before resolving.
    #[arg(long)]
    clean: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<SpriteConfig> {
        let mut config = match &self.config {
            Some(path) => SpriteConfig::load(path)?,
            None => SpriteConfig::default(),
        };
        if let Some(dir) = &self.custom_dir {
            config.custom_dir = dir.clone();
        }
        if let Some(dir) = &self.auto_dir {
            config.auto_dir = dir.clone();
        }
        if let Some(path) = &self.fallback {
            config.fallback = path.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        config.clean |= self.clean;
        Ok(config)
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let config = args.config().context("loading configuration")?;
    let holidays = read_holidays(&args.holidays)?;
    let keys = batch::unique_keys(&holidays);

    let resolver = Resolver::http(config)?;
    resolver.prepare()?;

    let report = batch::run(&resolver, &keys);

    let counts = report
        .tier_counts()
        .iter()
        .map(|(tier, n)| format!("{} {}", n, tier))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Resolved {}/{} sprites ({})", report.resolved.len(), keys.len(), counts);
    for e in &report.failed {
        println!("  FAILED {}", e);
    }
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
