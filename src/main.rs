use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing_subscriber::EnvFilter;

use last5_box::config::RunConfig;
use last5_box::pipeline;
use last5_box::source::MlbStatsApi;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut cfg = RunConfig::from_env();
    if let Some(out_dir) = arg_value("--out") {
        cfg.out_dir = PathBuf::from(out_dir);
    }
    let today = match arg_value("--date") {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("--date expects YYYY-MM-DD, got {raw:?}"))?,
        None => Local::now().date_naive(),
    };

    let source = MlbStatsApi::from_config(&cfg);
    let report = pipeline::run(&source, today, &cfg)?;

    println!("Last-5 report complete");
    println!("Window: {} .. {}", report.window.start, report.window.end);
    println!(
        "Games: {}/{} final",
        report.games_completed, report.games_scheduled
    );
    println!(
        "Lines: {} batting, {} pitching ({} dropped)",
        report.batting_lines, report.pitching_lines, report.dropped_entries
    );
    for (name, rows) in &report.table_rows {
        println!("  {name}: {rows} rows");
    }
    for path in &report.files {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
