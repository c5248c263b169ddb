use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::boxscore::BoxscoreData;
use crate::schedule::GameDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Away,
    Home,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Away => "away",
            Side::Home => "home",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineIdent {
    pub player_id: u64,
    pub player_name: String,
    pub team_side: Side,
    pub game_date: NaiveDate,
    pub game_id: u64,
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    /// Summed across games.
    Count,
    /// Averaged across games.
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatField {
    pub column: &'static str,
    pub agg_column: &'static str,
    pub kind: StatKind,
}

const fn count(column: &'static str, agg_column: &'static str) -> StatField {
    StatField {
        column,
        agg_column,
        kind: StatKind::Count,
    }
}

const fn rate(column: &'static str) -> StatField {
    StatField {
        column,
        agg_column: column,
        kind: StatKind::Rate,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Count(u32),
    Rate(f64),
}

impl StatValue {
    pub fn as_f64(self) -> f64 {
        match self {
            StatValue::Count(v) => f64::from(v),
            StatValue::Rate(v) => v,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(v) => write!(f, "{v}"),
            StatValue::Rate(v) => write!(f, "{v}"),
        }
    }
}

/// A single player's line from one game, with a fixed stat layout.
pub trait StatLine {
    /// Stat columns in output order. `values()` is aligned with this.
    const FIELDS: &'static [StatField];
    /// Index into `FIELDS` of the stat aggregate rows are ranked by.
    const VOLUME_FIELD: usize;

    fn ident(&self) -> &LineIdent;
    fn values(&self) -> Vec<StatValue>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattingLine {
    pub ident: LineIdent,
    pub ab: u32,
    pub r: u32,
    pub h: u32,
    pub doubles: u32,
    pub triples: u32,
    pub hr: u32,
    pub rbi: u32,
    pub sb: u32,
    pub bb: u32,
    pub k: u32,
    pub lob: u32,
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
}

pub const BATTING_FIELDS: &[StatField] = &[
    count("AB", "AB"),
    count("R", "R"),
    count("H", "H"),
    count("2B", "X2B"),
    count("3B", "X3B"),
    count("HR", "HR"),
    count("RBI", "RBI"),
    count("SB", "SB"),
    count("BB", "BB"),
    count("K", "K"),
    count("LOB", "LOB"),
    rate("AVG"),
    rate("OBP"),
    rate("SLG"),
    rate("OPS"),
];

impl StatLine for BattingLine {
    const FIELDS: &'static [StatField] = BATTING_FIELDS;
    const VOLUME_FIELD: usize = 0;

    fn ident(&self) -> &LineIdent {
        &self.ident
    }

    fn values(&self) -> Vec<StatValue> {
        use StatValue::{Count, Rate};
        vec![
            Count(self.ab),
            Count(self.r),
            Count(self.h),
            Count(self.doubles),
            Count(self.triples),
            Count(self.hr),
            Count(self.rbi),
            Count(self.sb),
            Count(self.bb),
            Count(self.k),
            Count(self.lob),
            Rate(self.avg),
            Rate(self.obp),
            Rate(self.slg),
            Rate(self.ops),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchingLine {
    pub ident: LineIdent,
    pub outs: u32,
    pub hits: u32,
    pub runs: u32,
    pub earned_runs: u32,
    pub walks: u32,
    pub strikeouts: u32,
    pub home_runs: u32,
    pub era: f64,
    pub batters_faced: u32,
    pub pitches: u32,
}

pub const PITCHING_FIELDS: &[StatField] = &[
    count("IP_outs", "Outs"),
    count("H_allowed", "H"),
    count("R_allowed", "R"),
    count("ER_allowed", "ER"),
    count("BB_allowed", "BB"),
    count("SO", "SO"),
    count("HR_allowed", "HR"),
    rate("ERA"),
    count("BF", "BF"),
    count("PC", "PC"),
];

impl StatLine for PitchingLine {
    const FIELDS: &'static [StatField] = PITCHING_FIELDS;
    const VOLUME_FIELD: usize = 0;

    fn ident(&self) -> &LineIdent {
        &self.ident
    }

    fn values(&self) -> Vec<StatValue> {
        use StatValue::{Count, Rate};
        vec![
            Count(self.outs),
            Count(self.hits),
            Count(self.runs),
            Count(self.earned_runs),
            Count(self.walks),
            Count(self.strikeouts),
            Count(self.home_runs),
            Rate(self.era),
            Count(self.batters_faced),
            Count(self.pitches),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineParseError {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("field `{field}`: expected a non-negative integer, got {value}")]
    Integer { field: &'static str, value: String },
    #[error("field `{field}`: expected a number, got {value}")]
    Float { field: &'static str, value: String },
    #[error("field `name`: expected a string, got {0}")]
    Name(String),
}

#[derive(Debug, Clone, Default)]
pub struct GameLines {
    pub batting: Vec<BattingLine>,
    pub pitching: Vec<PitchingLine>,
    pub dropped: usize,
}

pub fn extract_game_lines(game: &GameDescriptor, boxscore: &BoxscoreData) -> GameLines {
    let mut out = GameLines::default();
    let groups = [
        (&boxscore.away_batters, Side::Away),
        (&boxscore.home_batters, Side::Home),
    ];
    for (entries, side) in groups {
        out.dropped += extract_group(entries, side, game, parse_batting_line, &mut out.batting);
    }
    let groups = [
        (&boxscore.away_pitchers, Side::Away),
        (&boxscore.home_pitchers, Side::Home),
    ];
    for (entries, side) in groups {
        out.dropped += extract_group(entries, side, game, parse_pitching_line, &mut out.pitching);
    }
    out
}

/// Parses every entry after the leading header placeholder, keeping the ones
/// that coerce cleanly. Returns how many entries were dropped.
fn extract_group<L>(
    entries: &[Value],
    side: Side,
    game: &GameDescriptor,
    parse: fn(&Value, Side, &GameDescriptor) -> Result<L, LineParseError>,
    out: &mut Vec<L>,
) -> usize {
    let before = out.len();
    let candidates = entries.iter().skip(1);
    let total = candidates.len();
    out.extend(candidates.filter_map(|entry| {
        parse(entry, side, game)
            .map_err(|err| debug!(game_id = game.game_id, %side, %err, "dropping malformed entry"))
            .ok()
    }));
    total - (out.len() - before)
}

pub fn parse_batting_line(
    entry: &Value,
    side: Side,
    game: &GameDescriptor,
) -> Result<BattingLine, LineParseError> {
    if !entry.is_object() {
        return Err(LineParseError::NotAnObject);
    }
    Ok(BattingLine {
        ident: line_ident(entry, side, game)?,
        ab: count_field(entry, "ab")?,
        r: count_field(entry, "r")?,
        h: count_field(entry, "h")?,
        doubles: count_field(entry, "doubles")?,
        triples: count_field(entry, "triples")?,
        hr: count_field(entry, "hr")?,
        rbi: count_field(entry, "rbi")?,
        sb: count_field(entry, "sb")?,
        bb: count_field(entry, "bb")?,
        k: count_field(entry, "k")?,
        lob: count_field(entry, "lob")?,
        avg: rate_field(entry, "avg")?,
        obp: rate_field(entry, "obp")?,
        slg: rate_field(entry, "slg")?,
        ops: rate_field(entry, "ops")?,
    })
}

pub fn parse_pitching_line(
    entry: &Value,
    side: Side,
    game: &GameDescriptor,
) -> Result<PitchingLine, LineParseError> {
    if !entry.is_object() {
        return Err(LineParseError::NotAnObject);
    }
    Ok(PitchingLine {
        ident: line_ident(entry, side, game)?,
        outs: count_field(entry, "out")?,
        hits: count_field(entry, "h")?,
        runs: count_field(entry, "r")?,
        earned_runs: count_field(entry, "er")?,
        walks: count_field(entry, "bb")?,
        strikeouts: count_field(entry, "so")?,
        home_runs: count_field(entry, "hr")?,
        era: rate_field(entry, "era")?,
        batters_faced: count_field(entry, "bf")?,
        pitches: count_field(entry, "pc")?,
    })
}

fn line_ident(
    entry: &Value,
    side: Side,
    game: &GameDescriptor,
) -> Result<LineIdent, LineParseError> {
    let player_name = match entry.get("name") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(LineParseError::Name(other.to_string())),
    };
    Ok(LineIdent {
        player_id: integer_field(entry, "personId")?,
        player_name,
        team_side: side,
        game_date: game.game_date,
        game_id: game.game_id,
        start_time: game.start_time,
    })
}

/// Absent keys count as zero; everything else must be a non-negative integer.
fn integer_field(entry: &Value, field: &'static str) -> Result<u64, LineParseError> {
    let Some(value) = entry.get(field) else {
        return Ok(0);
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| LineParseError::Integer {
        field,
        value: value.to_string(),
    })
}

fn count_field(entry: &Value, field: &'static str) -> Result<u32, LineParseError> {
    let value = integer_field(entry, field)?;
    u32::try_from(value).map_err(|_| LineParseError::Integer {
        field,
        value: value.to_string(),
    })
}

/// Absent, null, empty and zero-like values read as 0.0.
fn rate_field(entry: &Value, field: &'static str) -> Result<f64, LineParseError> {
    let Some(value) = entry.get(field) else {
        return Ok(0.0);
    };
    let parsed = match value {
        Value::Null | Value::Bool(false) => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| LineParseError::Float {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn game() -> GameDescriptor {
        GameDescriptor {
            game_id: 7,
            game_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            start_time: None,
            status: "Final".to_string(),
        }
    }

    #[test]
    fn string_and_number_fields_both_coerce() {
        let entry = json!({
            "personId": "660271", "name": "Shohei Ohtani",
            "ab": "4", "r": 1, "h": " 2 ", "hr": 1, "avg": ".287", "ops": 0.95
        });
        let line = parse_batting_line(&entry, Side::Home, &game()).unwrap();
        assert_eq!(line.ident.player_id, 660271);
        assert_eq!(line.ab, 4);
        assert_eq!(line.h, 2);
        assert_eq!(line.doubles, 0);
        assert!((line.avg - 0.287).abs() < 1e-12);
        assert!((line.ops - 0.95).abs() < 1e-12);
        assert_eq!(line.obp, 0.0);
    }

    #[test]
    fn absent_or_empty_rates_default_to_zero() {
        let entry = json!({"personId": 1, "name": "A", "era": null});
        let line = parse_pitching_line(&entry, Side::Away, &game()).unwrap();
        assert_eq!(line.era, 0.0);
        let entry = json!({"personId": 1, "name": "A", "era": ""});
        assert_eq!(parse_pitching_line(&entry, Side::Away, &game()).unwrap().era, 0.0);
    }

    #[test]
    fn placeholder_rates_reject_the_line() {
        let entry = json!({"personId": 1, "name": "A", "era": "-.--"});
        let err = parse_pitching_line(&entry, Side::Away, &game()).unwrap_err();
        assert_eq!(
            err,
            LineParseError::Float {
                field: "era",
                value: "\"-.--\"".to_string()
            }
        );
    }

    #[test]
    fn negative_or_fractional_counts_reject_the_line() {
        for bad in [json!(-1), json!(2.5), json!("x"), json!(null)] {
            let entry = json!({"personId": 1, "name": "A", "ab": bad});
            assert!(parse_batting_line(&entry, Side::Away, &game()).is_err());
        }
    }

    #[test]
    fn header_entry_is_skipped() {
        let boxscore = BoxscoreData {
            away_batters: vec![
                json!({"personId": 0, "name": "Batters", "ab": "AB"}),
                json!({"personId": 5, "name": "B", "ab": 3}),
            ],
            ..BoxscoreData::default()
        };
        let lines = extract_game_lines(&game(), &boxscore);
        assert_eq!(lines.batting.len(), 1);
        assert_eq!(lines.batting[0].ident.player_id, 5);
        assert_eq!(lines.dropped, 0);
    }
}
