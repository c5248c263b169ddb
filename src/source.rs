use anyhow::{Context, Result};

use crate::boxscore::{BoxscoreData, boxscore_from_live_json};
use crate::config::RunConfig;
use crate::http_client::{fetch_with_retry, http_client};
use crate::schedule::{GameDescriptor, parse_schedule_json};
use crate::window::DateWindow;

/// Where schedules and box scores come from.
pub trait StatsSource: Sync {
    fn schedule(&self, window: &DateWindow) -> Result<Vec<GameDescriptor>>;
    fn boxscore(&self, game_id: u64) -> Result<BoxscoreData>;
}

/// The public MLB Stats API.
#[derive(Debug, Clone)]
pub struct MlbStatsApi {
    base_url: String,
    sport_id: u32,
    attempts: u32,
}

impl MlbStatsApi {
    pub fn new(base_url: impl Into<String>, sport_id: u32, attempts: u32) -> Self {
        Self {
            base_url: base_url.into(),
            sport_id,
            attempts,
        }
    }

    pub fn from_config(cfg: &RunConfig) -> Self {
        Self::new(cfg.base_url.clone(), cfg.sport_id, cfg.fetch_attempts)
    }

    pub fn schedule_url(&self, window: &DateWindow) -> String {
        format!(
            "{}/schedule?sportId={}&startDate={}&endDate={}",
            self.base_url,
            self.sport_id,
            window.start_param(),
            window.end_param()
        )
    }

    pub fn boxscore_url(&self, game_id: u64) -> String {
        format!("{}/game/{game_id}/boxscore", self.base_url)
    }
}

impl StatsSource for MlbStatsApi {
    fn schedule(&self, window: &DateWindow) -> Result<Vec<GameDescriptor>> {
        let client = http_client()?;
        let url = self.schedule_url(window);
        fetch_with_retry(client, &url, self.attempts, parse_schedule_json)
            .context("schedule fetch failed")
    }

    fn boxscore(&self, game_id: u64) -> Result<BoxscoreData> {
        let client = http_client()?;
        let url = self.boxscore_url(game_id);
        fetch_with_retry(client, &url, self.attempts, boxscore_from_live_json)
            .with_context(|| format!("boxscore fetch failed for game {game_id}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::window::lookback_window;

    #[test]
    fn urls_follow_stats_api_layout() {
        let api = MlbStatsApi::new("https://statsapi.mlb.com/api/v1", 1, 3);
        let window = lookback_window(NaiveDate::from_ymd_opt(2025, 7, 12).unwrap());
        assert_eq!(
            api.schedule_url(&window),
            "https://statsapi.mlb.com/api/v1/schedule?sportId=1&startDate=2025-07-02&endDate=2025-07-12"
        );
        assert_eq!(
            api.boxscore_url(776543),
            "https://statsapi.mlb.com/api/v1/game/776543/boxscore"
        );
    }
}
