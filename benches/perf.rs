use chrono::{Duration as ChronoDuration, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use last5_box::boxscore::boxscore_from_live_json;
use last5_box::last5::{TieBreak, aggregate, select_last5, widen};
use last5_box::lines::{BattingLine, LineIdent, Side, extract_game_lines};
use last5_box::pipeline::build_reports;
use last5_box::schedule::GameDescriptor;

fn sample_batting(players: u64, days: i64) -> Vec<BattingLine> {
    let base = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
    let mut lines = Vec::new();
    for day in 0..days {
        for player_id in 1..=players {
            let ab = ((player_id + day as u64) % 5) as u32;
            lines.push(BattingLine {
                ident: LineIdent {
                    player_id,
                    player_name: format!("Player {player_id}"),
                    team_side: if player_id % 2 == 0 { Side::Home } else { Side::Away },
                    game_date: base + ChronoDuration::days(day),
                    game_id: day as u64,
                    start_time: None,
                },
                ab,
                r: 0,
                h: ab / 2,
                doubles: 0,
                triples: 0,
                hr: 0,
                rbi: 1,
                sb: 0,
                bb: 1,
                k: 1,
                lob: 2,
                avg: 0.250,
                obp: 0.320,
                slg: 0.410,
                ops: 0.730,
            });
        }
    }
    lines
}

fn bench_live_boxscore_extract(c: &mut Criterion) {
    let game = GameDescriptor {
        game_id: 1001,
        game_date: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
        start_time: None,
        status: "Final".to_string(),
    };
    c.bench_function("live_boxscore_extract", |b| {
        b.iter(|| {
            let data = boxscore_from_live_json(black_box(BOXSCORE_LIVE_JSON)).unwrap();
            let lines = extract_game_lines(&game, &data);
            black_box(lines.batting.len());
        })
    });
}

fn bench_last5_transform(c: &mut Criterion) {
    let lines = sample_batting(400, 10);
    c.bench_function("last5_select_aggregate_widen", |b| {
        b.iter(|| {
            let last5 = select_last5(black_box(&lines), TieBreak::FetchOrder);
            let agg = aggregate(&last5).unwrap();
            let wide = widen(&last5);
            black_box((agg.len(), wide.len()));
        })
    });
}

fn bench_build_reports(c: &mut Criterion) {
    let lines = sample_batting(400, 10);
    c.bench_function("build_reports", |b| {
        b.iter(|| {
            let reports = build_reports(black_box(&lines), &[], TieBreak::FetchOrder).unwrap();
            black_box(reports.wide_batting.rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_live_boxscore_extract,
    bench_last5_transform,
    bench_build_reports
);
criterion_main!(perf);

static BOXSCORE_LIVE_JSON: &str = include_str!("../tests/fixtures/boxscore_live.json");
