//! Data access port trait.

use crate::domain::analysis::Interval;
use crate::domain::error::TrailstopError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Full available history for a ticker at the given bar interval,
    /// sorted by ascending date.
    fn fetch_history(
        &self,
        ticker: &str,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, TrailstopError>;

    /// Tickers with data available at the given interval.
    fn list_symbols(&self, interval: Interval) -> Result<Vec<String>, TrailstopError>;

    /// (first date, last date, bar count) for a ticker, `None` when the
    /// ticker has no data.
    fn data_range(
        &self,
        ticker: &str,
        interval: Interval,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrailstopError>;
}
