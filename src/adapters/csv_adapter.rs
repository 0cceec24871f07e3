//! CSV file data adapter.
//!
//! One file per ticker and interval, `{TICKER}_{interval}.csv`, with
//! columns date,open,high,low,close,volume.

use crate::adapters::normalize_ticker;
use crate::domain::analysis::Interval;
use crate::domain::error::TrailstopError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrailstopError> {
        let dir = config
            .get_string("data", "dir")
            .ok_or_else(|| TrailstopError::ConfigMissing {
                section: "data".into(),
                key: "dir".into(),
            })?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn csv_path(&self, ticker: &str, interval: Interval) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", normalize_ticker(ticker), interval))
    }

    fn parse_field<T: std::str::FromStr>(
        record: &csv::StringRecord,
        index: usize,
        name: &str,
    ) -> Result<T, TrailstopError>
    where
        T::Err: std::fmt::Display,
    {
        let raw = record.get(index).ok_or_else(|| TrailstopError::Data {
            reason: format!("missing {name} column"),
        })?;
        raw.parse().map_err(|e| TrailstopError::Data {
            reason: format!("invalid {name} value {raw:?}: {e}"),
        })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, TrailstopError> {
        let path = self.csv_path(ticker, interval);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TrailstopError::NoData {
                    ticker: ticker.to_string(),
                });
            }
            Err(e) => {
                return Err(TrailstopError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TrailstopError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| TrailstopError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TrailstopError::Data {
                    reason: format!("invalid date {date_str:?}: {e}"),
                }
            })?;

            bars.push(OhlcvBar {
                ticker: normalize_ticker(ticker),
                date,
                open: Self::parse_field(&record, 1, "open")?,
                high: Self::parse_field(&record, 2, "high")?,
                low: Self::parse_field(&record, 3, "low")?,
                close: Self::parse_field(&record, 4, "close")?,
                volume: Self::parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, TrailstopError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrailstopError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{interval}.csv");
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TrailstopError::Data {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(&suffix) {
                symbols.push(ticker.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        ticker: &str,
        interval: Interval,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrailstopError> {
        match self.fetch_history(ticker, interval) {
            Ok(bars) => match (bars.first(), bars.last()) {
                (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
                _ => Ok(None),
            },
            Err(TrailstopError::NoData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
