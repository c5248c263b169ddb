use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

pub const FINAL_STATUS: &str = "Final";

#[derive(Debug, Clone, PartialEq)]
pub struct GameDescriptor {
    pub game_id: u64,
    pub game_date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub status: String,
}

impl GameDescriptor {
    pub fn is_final(&self) -> bool {
        self.status == FINAL_STATUS
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    date: Option<String>,
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
struct ScheduleGame {
    #[serde(rename = "gamePk")]
    game_pk: u64,
    #[serde(rename = "officialDate")]
    official_date: Option<String>,
    #[serde(rename = "gameDate")]
    game_date: Option<String>,
    #[serde(default)]
    status: ScheduleStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleStatus {
    #[serde(rename = "detailedState", default)]
    detailed_state: String,
}

pub fn parse_schedule_json(raw: &str) -> Result<Vec<GameDescriptor>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let data: ScheduleResponse = serde_json::from_str(trimmed).context("invalid schedule json")?;

    let mut games = Vec::new();
    for day in data.dates {
        for game in day.games {
            let date_raw = game
                .official_date
                .as_deref()
                .or(day.date.as_deref())
                .with_context(|| format!("game {} has no date", game.game_pk))?;
            let game_date = parse_date(date_raw)
                .with_context(|| format!("game {} has bad date {date_raw:?}", game.game_pk))?;
            let start_time = game.game_date.as_deref().and_then(parse_start_time);
            games.push(GameDescriptor {
                game_id: game.game_pk,
                game_date,
                start_time,
                status: game.status.detailed_state,
            });
        }
    }
    Ok(games)
}

pub fn completed_games(games: Vec<GameDescriptor>) -> Vec<GameDescriptor> {
    games.into_iter().filter(GameDescriptor::is_final).collect()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").context("expected YYYY-MM-DD")
}

fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
