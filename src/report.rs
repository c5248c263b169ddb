use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::last5::{AggregateRow, LAST_N, WideRow, wide_column_name};
use crate::lines::{StatField, StatLine};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row` under header `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

pub fn raw_table<L: StatLine>(lines: &[L]) -> Table {
    let mut headers = strings(&["player_id", "player_name", "team_side", "game_date"]);
    headers.extend(L::FIELDS.iter().map(|f| f.column.to_string()));

    let rows = lines
        .iter()
        .map(|line| {
            let ident = line.ident();
            let mut row = vec![
                ident.player_id.to_string(),
                ident.player_name.clone(),
                ident.team_side.to_string(),
                ident.game_date.format("%Y-%m-%d").to_string(),
            ];
            row.extend(line.values().iter().map(|v| v.to_string()));
            row
        })
        .collect();

    Table { headers, rows }
}

pub fn aggregate_table(fields: &[StatField], rows: &[AggregateRow]) -> Table {
    let mut headers = strings(&["player_id", "player_name", "G"]);
    headers.extend(fields.iter().map(|f| f.agg_column.to_string()));

    let rows = rows
        .iter()
        .map(|agg| {
            let mut row = vec![
                agg.player_id.to_string(),
                agg.player_name.clone(),
                agg.games.to_string(),
            ];
            row.extend(agg.values.iter().map(|v| v.to_string()));
            row
        })
        .collect();

    Table { headers, rows }
}

/// Always carries all `LAST_N` rank columns per stat; ranks a player never
/// reached are left blank.
pub fn wide_table(fields: &[StatField], rows: &[WideRow]) -> Table {
    let mut headers = strings(&["player_id", "player_name"]);
    for field in fields {
        headers.extend((1..=LAST_N).map(|rank| wide_column_name(field.column, rank)));
    }

    let rows = rows
        .iter()
        .map(|wide| {
            let mut row = vec![wide.player_id.to_string(), wide.player_name.clone()];
            row.extend(
                wide.cells
                    .iter()
                    .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()),
            );
            row
        })
        .collect();

    Table { headers, rows }
}

pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("open {} for writing", path.display()))?;
    writer
        .write_record(&table.headers)
        .with_context(|| format!("write header to {}", path.display()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// One worksheet per `(sheet name, table)` pair, in order.
pub fn write_workbook(path: &Path, sheets: &[(&str, &Table)]) -> Result<()> {
    let mut workbook = Workbook::new();
    for (name, table) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, &table.headers, &table.rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    for (col_idx, value) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, value)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let result = match value.parse::<f64>() {
                Ok(num) if num.is_finite() => worksheet.write_number(sheet_row, col_idx as u16, num),
                _ => worksheet.write_string(sheet_row, col_idx as u16, value),
            };
            result.with_context(|| format!("write cell ({sheet_row},{col_idx})"))?;
        }
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
