#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use trailstop::domain::analysis::Interval;
use trailstop::domain::error::TrailstopError;
pub use trailstop::domain::ohlcv::OhlcvBar;
use trailstop::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        ticker: &str,
        _interval: Interval,
    ) -> Result<Vec<OhlcvBar>, TrailstopError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TrailstopError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) => Ok(bars.clone()),
            None => Err(TrailstopError::NoData {
                ticker: ticker.to_string(),
            }),
        }
    }

    fn list_symbols(&self, _interval: Interval) -> Result<Vec<String>, TrailstopError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        ticker: &str,
        _interval: Interval,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrailstopError> {
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(ticker: &str, date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// Steadily rising series, +2 per bar.
pub fn rising_bars(ticker: &str, start: NaiveDate, days: usize, start_price: f64) -> Vec<OhlcvBar> {
    (0..days)
        .map(|i| {
            let close = start_price + i as f64 * 2.0;
            OhlcvBar {
                ticker: ticker.to_string(),
                date: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 3.0,
                low: close - 1.0,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}

/// Steadily dropping series, -2 per bar.
pub fn dropping_bars(
    ticker: &str,
    start: NaiveDate,
    days: usize,
    start_price: f64,
) -> Vec<OhlcvBar> {
    (0..days)
        .map(|i| {
            let close = start_price - i as f64 * 2.0;
            OhlcvBar {
                ticker: ticker.to_string(),
                date: start + Duration::days(i as i64),
                open: close + 0.5,
                high: close + 1.0,
                low: close - 3.0,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}
