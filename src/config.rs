use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::last5::TieBreak;

pub const DEFAULT_BASE_URL: &str = "https://statsapi.mlb.com/api/v1";
pub const MLB_SPORT_ID: u32 = 1;
pub const WORKBOOK_FILE: &str = "last5_report.xlsx";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub out_dir: PathBuf,
    pub base_url: String,
    pub sport_id: u32,
    pub tie_break: TieBreak,
    /// Also write every table into one workbook.
    pub write_xlsx: bool,
    pub fetch_attempts: u32,
    pub fetch_parallelism: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            base_url: DEFAULT_BASE_URL.to_string(),
            sport_id: MLB_SPORT_ID,
            tie_break: TieBreak::FetchOrder,
            write_xlsx: false,
            fetch_attempts: 3,
            fetch_parallelism: 1,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let out_dir = env_string("LAST5_OUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.out_dir);
        let base_url = env_string("MLB_STATS_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let sport_id = env::var("MLB_SPORT_ID")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.sport_id);
        let tie_break = tie_break_or_default(env_string("LAST5_TIE_BREAK").as_deref());
        let fetch_attempts = clamped_or(
            env_string("FETCH_ATTEMPTS").as_deref(),
            defaults.fetch_attempts,
            1,
            10,
        );
        let fetch_parallelism = clamped_or(
            env_string("FETCH_PARALLELISM").as_deref(),
            defaults.fetch_parallelism,
            1,
            16,
        );

        Self {
            out_dir,
            base_url,
            sport_id,
            tie_break,
            write_xlsx: env_bool("LAST5_XLSX", defaults.write_xlsx),
            fetch_attempts,
            fetch_parallelism,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    parse_bool(env::var(key).ok().as_deref(), default)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    raw.map(|v| v.trim().to_ascii_lowercase())
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn tie_break_or_default(raw: Option<&str>) -> TieBreak {
    match raw.map(str::parse::<TieBreak>) {
        Some(Ok(tie_break)) => tie_break,
        Some(Err(err)) => {
            warn!(%err, "ignoring LAST5_TIE_BREAK");
            TieBreak::default()
        }
        None => TieBreak::default(),
    }
}

/// Unparseable values fall back to `default`; the result is clamped either way.
fn clamped_or<T>(raw: Option<&str>, default: T, min: T, max: T) -> T
where
    T: FromStr + Ord,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}
