//! Fetch public holidays into the JSON file the sprite resolver reads.
//! Run with: cargo run --bin scrape-holidays -- --year 2024
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::Parser;

use holiday_sprites::holidays::HolidaySource;
use holiday_sprites::holidays::loader::{self, DEFAULT_COUNTRY, NAGER_BASE_URL};
use holiday_sprites::logging;

#[derive(Debug, Parser)]
#[command(name = "scrape-holidays", version)]
struct Args {
    /// Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,

    /// ISO 3166-1 alpha-2 country code.
    #[arg(long, default_value = DEFAULT_COUNTRY)]
    country: String,

    #[arg(short, long, default_value = "events/holidays.json")]
    output: PathBuf,

    /// Write records exactly as the API returns them.
    #[arg(long)]
    no_enrich: bool,

    #[arg(long, default_value = NAGER_BASE_URL)]
    base_url: String,

    #[arg(long, default_value_t = 15)]
    timeout: u64,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let now = Utc::now();
    let year = args.year.unwrap_or_else(|| now.year());

    let source = HolidaySource::new(&args.base_url, Duration::from_secs(args.timeout))?;
    let count = loader::scrape(&source, year, &args.country, &args.output, !args.no_enrich, now)
        .with_context(|| {
            format!(
                "scraping {} holidays for {} into {}",
                args.country,
                year,
                args.output.display()
            )
        })?;

    println!("Wrote {} holidays to {}", count, args.output.display());
    Ok(())
}
