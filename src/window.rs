use chrono::{Duration as ChronoDuration, NaiveDate};

/// Days looked back from the anchor date. Ten calendar days is enough to
/// cover five game days for an everyday player.
pub const LOOKBACK_DAYS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

pub fn lookback_window(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: today - ChronoDuration::days(LOOKBACK_DAYS),
        end: today,
    }
}
