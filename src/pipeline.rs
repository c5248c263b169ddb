use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::boxscore::BoxscoreData;
use crate::config::{RunConfig, WORKBOOK_FILE};
use crate::last5::{TieBreak, aggregate, select_last5, widen};
use crate::lines::{BattingLine, GameLines, PitchingLine, StatLine, extract_game_lines};
use crate::report::{Table, aggregate_table, raw_table, wide_table, write_csv, write_workbook};
use crate::schedule::{GameDescriptor, completed_games};
use crate::source::StatsSource;
use crate::window::{DateWindow, lookback_window};

#[derive(Debug, Clone)]
pub struct Reports {
    pub raw_batting: Table,
    pub agg_batting: Table,
    pub wide_batting: Table,
    pub raw_pitching: Table,
    pub agg_pitching: Table,
    pub wide_pitching: Table,
}

impl Reports {
    /// File stem and table, in write order.
    pub fn named(&self) -> [(&'static str, &Table); 6] {
        [
            ("raw_last5_batting", &self.raw_batting),
            ("agg_last5_batting", &self.agg_batting),
            ("wide_last5_batting", &self.wide_batting),
            ("raw_last5_pitching", &self.raw_pitching),
            ("agg_last5_pitching", &self.agg_pitching),
            ("wide_last5_pitching", &self.wide_pitching),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub window: DateWindow,
    pub games_scheduled: usize,
    pub games_completed: usize,
    pub batting_lines: usize,
    pub pitching_lines: usize,
    pub dropped_entries: usize,
    pub table_rows: Vec<(&'static str, usize)>,
    pub files: Vec<PathBuf>,
}

pub fn run<S: StatsSource>(source: &S, today: NaiveDate, cfg: &RunConfig) -> Result<RunReport> {
    let window = lookback_window(today);
    info!(start = %window.start, end = %window.end, "fetching schedule");

    let scheduled = source.schedule(&window)?;
    let games_scheduled = scheduled.len();
    let games = completed_games(scheduled);
    info!(scheduled = games_scheduled, completed = games.len(), "schedule loaded");

    let lines = collect_lines(source, &games, cfg.fetch_parallelism)?;
    info!(
        batting = lines.batting.len(),
        pitching = lines.pitching.len(),
        dropped = lines.dropped,
        "box score lines extracted"
    );

    let reports = build_reports(&lines.batting, &lines.pitching, cfg.tie_break)?;
    let files = write_reports(&reports, cfg)?;

    Ok(RunReport {
        window,
        games_scheduled,
        games_completed: games.len(),
        batting_lines: lines.batting.len(),
        pitching_lines: lines.pitching.len(),
        dropped_entries: lines.dropped,
        table_rows: reports
            .named()
            .iter()
            .map(|(name, table)| (*name, table.rows.len()))
            .collect(),
        files,
    })
}

/// Fetches every game's box score and extracts its lines, keeping schedule
/// order. Any fetch failure aborts.
pub fn collect_lines<S: StatsSource>(
    source: &S,
    games: &[GameDescriptor],
    parallelism: usize,
) -> Result<GameLines> {
    let boxscores: Vec<BoxscoreData> = if parallelism <= 1 {
        games
            .iter()
            .map(|game| source.boxscore(game.game_id))
            .collect::<Result<_>>()?
    } else {
        with_fetch_pool(parallelism, || {
            games
                .par_iter()
                .map(|game| source.boxscore(game.game_id))
                .collect::<Result<_>>()
        })?
    };

    let mut out = GameLines::default();
    for (game, boxscore) in games.iter().zip(&boxscores) {
        let lines = extract_game_lines(game, boxscore);
        debug!(
            game_id = game.game_id,
            batting = lines.batting.len(),
            pitching = lines.pitching.len(),
            dropped = lines.dropped,
            "game extracted"
        );
        out.batting.extend(lines.batting);
        out.pitching.extend(lines.pitching);
        out.dropped += lines.dropped;
    }
    Ok(out)
}

pub fn build_reports(
    batting: &[BattingLine],
    pitching: &[PitchingLine],
    tie_break: TieBreak,
) -> Result<Reports> {
    let (raw_batting, agg_batting, wide_batting) = build_tables(batting, tie_break)?;
    let (raw_pitching, agg_pitching, wide_pitching) = build_tables(pitching, tie_break)?;
    Ok(Reports {
        raw_batting,
        agg_batting,
        wide_batting,
        raw_pitching,
        agg_pitching,
        wide_pitching,
    })
}

fn build_tables<L: StatLine + Clone>(
    lines: &[L],
    tie_break: TieBreak,
) -> Result<(Table, Table, Table)> {
    let last5 = select_last5(lines, tie_break);
    let raw = raw_table(&last5);
    let agg = aggregate_table(L::FIELDS, &aggregate(&last5)?);
    let wide = wide_table(L::FIELDS, &widen(&last5));
    Ok((raw, agg, wide))
}

pub fn write_reports(reports: &Reports, cfg: &RunConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for (stem, table) in reports.named() {
        let path = cfg.out_dir.join(format!("{stem}.csv"));
        write_csv(&path, table)?;
        info!(path = %path.display(), rows = table.rows.len(), "wrote report");
        files.push(path);
    }

    if cfg.write_xlsx {
        let path = cfg.out_dir.join(WORKBOOK_FILE);
        write_workbook(&path, &reports.named())
            .with_context(|| format!("workbook export to {}", path.display()))?;
        info!(path = %path.display(), "wrote workbook");
        files.push(path);
    }
    Ok(files)
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
