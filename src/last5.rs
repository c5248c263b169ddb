use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};

use crate::lines::{LineIdent, StatField, StatKind, StatLine, StatValue};

pub const LAST_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    FetchOrder,
    StartTime,
}

impl FromStr for TieBreak {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "fetch" | "fetch_order" => Ok(TieBreak::FetchOrder),
            "start" | "start_time" => Ok(TieBreak::StartTime),
            other => Err(anyhow!("unknown tie break {other:?}")),
        }
    }
}

#[derive(Debug)]
pub struct PlayerWindow<'a, L> {
    pub player_id: u64,
    pub lines: Vec<&'a L>,
}

pub fn player_windows<L: StatLine>(lines: &[L], tie_break: TieBreak) -> Vec<PlayerWindow<'_, L>> {
    let mut ordered: Vec<&L> = lines.iter().collect();
    ordered.sort_by(|a, b| compare_recency(a.ident(), b.ident(), tie_break));

    let mut windows: Vec<PlayerWindow<'_, L>> = Vec::new();
    for line in ordered {
        let player_id = line.ident().player_id;
        if !windows.last().is_some_and(|w| w.player_id == player_id) {
            windows.push(PlayerWindow {
                player_id,
                lines: Vec::with_capacity(LAST_N),
            });
        }
        if let Some(window) = windows.last_mut() {
            if window.lines.len() < LAST_N {
                window.lines.push(line);
            }
        }
    }
    windows
}

pub fn select_last5<L: StatLine + Clone>(lines: &[L], tie_break: TieBreak) -> Vec<L> {
    player_windows(lines, tie_break)
        .into_iter()
        .flat_map(|window| window.lines.into_iter().cloned())
        .collect()
}

fn compare_recency(a: &LineIdent, b: &LineIdent, tie_break: TieBreak) -> Ordering {
    a.player_id
        .cmp(&b.player_id)
        .then_with(|| b.game_date.cmp(&a.game_date))
        .then_with(|| match tie_break {
            TieBreak::FetchOrder => Ordering::Equal,
            TieBreak::StartTime => match (a.start_time, b.start_time) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub player_id: u64,
    pub player_name: String,
    pub games: usize,
    pub fields: &'static [StatField],
    pub values: Vec<StatValue>,
}

impl AggregateRow {
    pub fn stat(&self, agg_column: &str) -> Option<StatValue> {
        let idx = self.fields.iter().position(|f| f.agg_column == agg_column)?;
        self.values.get(idx).copied()
    }
}

/// Rates are the plain mean of each game's published rate, not a rate
/// recomputed from the summed components.
pub fn aggregate<L: StatLine>(last5: &[L]) -> Result<Vec<AggregateRow>> {
    let mut groups: BTreeMap<(u64, &str), Vec<&L>> = BTreeMap::new();
    for line in last5 {
        let ident = line.ident();
        groups
            .entry((ident.player_id, ident.player_name.as_str()))
            .or_default()
            .push(line);
    }

    let mut rows = groups
        .into_iter()
        .map(|((player_id, player_name), lines)| -> Result<AggregateRow> {
            let games = lines
                .iter()
                .map(|l| l.ident().game_date)
                .collect::<BTreeSet<_>>()
                .len();
            let per_game: Vec<Vec<StatValue>> = lines.iter().map(|l| l.values()).collect();
            let values = L::FIELDS
                .iter()
                .enumerate()
                .map(|(idx, field)| fold_stat(field, per_game.iter().map(|v| v[idx])))
                .collect::<Result<Vec<_>>>()?;
            Ok(AggregateRow {
                player_id,
                player_name: player_name.to_string(),
                games,
                fields: L::FIELDS,
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    rows.sort_by(|a, b| {
        let a = a.values[L::VOLUME_FIELD].as_f64();
        let b = b.values[L::VOLUME_FIELD].as_f64();
        b.total_cmp(&a)
    });
    Ok(rows)
}

fn fold_stat(field: &StatField, mut values: impl Iterator<Item = StatValue>) -> Result<StatValue> {
    match field.kind {
        StatKind::Count => {
            let total = values.try_fold(0u32, |total, v| match v {
                StatValue::Count(n) => Ok(total.saturating_add(n)),
                StatValue::Rate(r) => bail!("{} is a counting stat, got rate {r}", field.column),
            })?;
            Ok(StatValue::Count(total))
        }
        StatKind::Rate => {
            let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v.as_f64(), n + 1));
            Ok(StatValue::Rate(if n == 0 { 0.0 } else { sum / n as f64 }))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub player_id: u64,
    pub player_name: String,
    pub fields: &'static [StatField],
    // cells[field * LAST_N + rank - 1]
    pub cells: Vec<Option<StatValue>>,
}

impl WideRow {
    pub fn get(&self, column: &str, rank: usize) -> Option<StatValue> {
        if rank == 0 || rank > LAST_N {
            return None;
        }
        let idx = self.fields.iter().position(|f| f.column == column)?;
        self.cells.get(idx * LAST_N + rank - 1).copied().flatten()
    }
}

pub fn wide_column_name(column: &str, rank: usize) -> String {
    format!("{column}_g{rank}")
}

/// Ranks count per `player_id` in input order, so a renamed player keeps
/// ranking across both name rows.
pub fn widen<L: StatLine>(last5: &[L]) -> Vec<WideRow> {
    let mut ranks: HashMap<u64, usize> = HashMap::new();
    let mut rows: BTreeMap<(u64, &str), WideRow> = BTreeMap::new();

    for line in last5 {
        let ident = line.ident();
        let rank = ranks.entry(ident.player_id).or_insert(0);
        *rank += 1;
        if *rank > LAST_N {
            continue;
        }
        let slot = *rank - 1;

        let row = rows
            .entry((ident.player_id, ident.player_name.as_str()))
            .or_insert_with(|| WideRow {
                player_id: ident.player_id,
                player_name: ident.player_name.clone(),
                fields: L::FIELDS,
                cells: vec![None; L::FIELDS.len() * LAST_N],
            });
        for (idx, value) in line.values().into_iter().enumerate() {
            row.cells[idx * LAST_N + slot] = Some(value);
        }
    }

    rows.into_values().collect()
}
