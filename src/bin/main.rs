/*
SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza
*/

extern crate pts_monitor;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::time::Duration;

use pts_monitor::render;
use pts_monitor::{
    AggregationRequest, AppConfig, ComposeOptions, HttpPageSource, MonitorSession, SessionMode,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Milliseconds between page requests (never below 100)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Per-request timeout in seconds for ranking pages
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ranked movers joined with today's disclosures
    Rank(RankArgs),
    /// Today's (or a given day's) disclosure listing
    Disclosures {
        /// YYYYMMDD or YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Only this 4-character code
        #[arg(long)]
        code: Option<String>,
    },
    /// Four values and disclosures for one code
    Detail {
        code: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
struct RankArgs {
    /// night | day | exchange
    #[arg(long, default_value = "night")]
    mode: SessionMode,

    /// Minimum |change %|; defaults to MONITOR_THRESHOLD_PERCENT or 3.0
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum rows (0 = all)
    #[arg(long, default_value_t = 50)]
    max_items: usize,

    /// Lower price bound (0 = off)
    #[arg(long, default_value_t = 0.0)]
    min_price: f64,

    /// Upper price bound (0 = off)
    #[arg(long, default_value_t = 0.0)]
    max_price: f64,

    /// Only rows with a disclosure today
    #[arg(long)]
    with_disclosures: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(ms) = cli.delay_ms {
        config.request_delay = Duration::from_millis(ms);
    }
    if let Some(s) = cli.timeout {
        config.ranking_timeout = Duration::from_secs(s);
    }

    let source = HttpPageSource::new(&config.user_agent).context("building http client")?;
    let threshold_default = config.threshold_percent;
    let mut session = MonitorSession::new(config, source).context("invalid screen schema")?;

    match cli.command {
        Command::Rank(args) => {
            let threshold = args.threshold.unwrap_or(threshold_default);
            let request = AggregationRequest {
                mode: args.mode,
                threshold_percent: threshold,
                max_items: args.max_items,
            };
            if !request.threshold_is_valid() {
                bail!("--threshold must be a finite number >= 0, got {threshold}");
            }
            let options = ComposeOptions {
                min_price: args.min_price,
                max_price: args.max_price,
                disclosures_only: args.with_disclosures,
                max_items: args.max_items,
            };
            info!("fetching {} ranking (threshold {threshold}%)", args.mode);
            let snap = session.refresh(request, options);

            for r in snap.reports.iter().filter(|r| r.stop.is_failure()) {
                warn!("{}: incomplete ({})", r.source, r.stop);
            }

            if args.json {
                println!("{}", serde_json::to_string_pretty(&*snap)?);
            } else {
                println!("{}", render::snapshot_header(&snap));
                print!("{}", render::ranking_table(&snap.result));
            }
        }
        Command::Disclosures { date, code } => {
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => MonitorSession::<HttpPageSource>::today(),
            };
            let index = session.disclosures(date);
            print!("{}", render::disclosure_listing(&index, code.as_deref()));
        }
        Command::Detail { code, name } => {
            let view = session.detail(code.trim(), name.as_deref());
            print!("{}", render::detail(&view));
        }
    }

    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .with_context(|| format!("invalid date `{s}` (YYYYMMDD or YYYY-MM-DD expected)"))
}
