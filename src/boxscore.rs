use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Per-side batter and pitcher listings for one game. Each group starts with
/// a header placeholder entry followed by one field-mapping per player.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoxscoreData {
    #[serde(rename = "awayBatters", default)]
    pub away_batters: Vec<Value>,
    #[serde(rename = "homeBatters", default)]
    pub home_batters: Vec<Value>,
    #[serde(rename = "awayPitchers", default)]
    pub away_pitchers: Vec<Value>,
    #[serde(rename = "homePitchers", default)]
    pub home_pitchers: Vec<Value>,
}

// (output key, per-game stat key)
const BATTING_COUNTS: &[(&str, &str)] = &[
    ("ab", "atBats"),
    ("r", "runs"),
    ("h", "hits"),
    ("doubles", "doubles"),
    ("triples", "triples"),
    ("hr", "homeRuns"),
    ("rbi", "rbi"),
    ("sb", "stolenBases"),
    ("bb", "baseOnBalls"),
    ("k", "strikeOuts"),
    ("lob", "leftOnBase"),
];

const BATTING_RATES: &[(&str, &str)] = &[
    ("avg", "avg"),
    ("obp", "obp"),
    ("slg", "slg"),
    ("ops", "ops"),
];

const PITCHING_COUNTS: &[(&str, &str)] = &[
    ("out", "outs"),
    ("h", "hits"),
    ("r", "runs"),
    ("er", "earnedRuns"),
    ("bb", "baseOnBalls"),
    ("so", "strikeOuts"),
    ("hr", "homeRuns"),
    ("bf", "battersFaced"),
    ("pc", "numberOfPitches"),
];

const PITCHING_RATES: &[(&str, &str)] = &[("era", "era")];

pub fn parse_boxscore_data_json(raw: &str) -> Result<BoxscoreData> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(BoxscoreData::default());
    }
    serde_json::from_str(trimmed).context("invalid boxscore data json")
}

/// Builds the per-side listings from a Stats API `game/{pk}/boxscore` payload.
pub fn boxscore_from_live_json(raw: &str) -> Result<BoxscoreData> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(BoxscoreData::default());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid live boxscore json")?;
    let teams = root.get("teams").unwrap_or(&Value::Null);
    let away = teams.get("away").unwrap_or(&Value::Null);
    let home = teams.get("home").unwrap_or(&Value::Null);

    Ok(BoxscoreData {
        away_batters: side_group(away, "batters", "batting", BATTING_COUNTS, BATTING_RATES),
        home_batters: side_group(home, "batters", "batting", BATTING_COUNTS, BATTING_RATES),
        away_pitchers: side_group(away, "pitchers", "pitching", PITCHING_COUNTS, PITCHING_RATES),
        home_pitchers: side_group(home, "pitchers", "pitching", PITCHING_COUNTS, PITCHING_RATES),
    })
}

fn side_group(
    side: &Value,
    list_key: &str,
    stat_group: &str,
    counts: &[(&str, &str)],
    rates: &[(&str, &str)],
) -> Vec<Value> {
    let mut out = vec![header_entry(list_key, counts, rates)];
    let Some(ids) = side.get(list_key).and_then(|v| v.as_array()) else {
        return out;
    };
    let players = side.get("players").unwrap_or(&Value::Null);
    for id in ids {
        let Some(id) = id.as_u64() else {
            continue;
        };
        let Some(player) = players.get(format!("ID{id}")) else {
            continue;
        };
        // Only players who took a lineup slot count as batters.
        if list_key == "batters" && !in_batting_order(player) {
            continue;
        }
        out.push(player_entry(id, player, stat_group, counts, rates));
    }
    out
}

fn in_batting_order(player: &Value) -> bool {
    match player.get("battingOrder") {
        Some(Value::String(slot)) => !slot.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

fn header_entry(list_key: &str, counts: &[(&str, &str)], rates: &[(&str, &str)]) -> Value {
    let mut map = Map::new();
    let title = if list_key == "batters" {
        "Batters"
    } else {
        "Pitchers"
    };
    map.insert("name".to_string(), Value::String(title.to_string()));
    map.insert("personId".to_string(), Value::from(0));
    for (key, _) in counts.iter().chain(rates.iter()) {
        map.insert(key.to_string(), Value::String(key.to_uppercase()));
    }
    Value::Object(map)
}

fn player_entry(
    id: u64,
    player: &Value,
    stat_group: &str,
    counts: &[(&str, &str)],
    rates: &[(&str, &str)],
) -> Value {
    let mut map = Map::new();
    map.insert("personId".to_string(), Value::from(id));
    let name = player
        .get("person")
        .and_then(|p| {
            p.get("boxscoreName")
                .and_then(Value::as_str)
                .filter(|name| !name.trim().is_empty())
                .or_else(|| p.get("fullName").and_then(Value::as_str))
        })
        .unwrap_or_default();
    map.insert("name".to_string(), Value::String(name.to_string()));

    let game_stats = player
        .get("stats")
        .and_then(|s| s.get(stat_group))
        .unwrap_or(&Value::Null);
    for (key, source) in counts {
        if let Some(value) = game_stats.get(*source) {
            map.insert(key.to_string(), value.clone());
        }
    }

    let season_stats = player
        .get("seasonStats")
        .and_then(|s| s.get(stat_group))
        .unwrap_or(&Value::Null);
    for (key, source) in rates {
        if let Some(value) = season_stats.get(*source) {
            map.insert(key.to_string(), value.clone());
        }
    }

    Value::Object(map)
}
