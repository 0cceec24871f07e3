//! Ratchet trailing stop derived from ATR.
//!
//! While the previous close sits above the previous stop, the stop only
//! moves up. A close at or below the stop resets it to the fresh basic
//! stop on the next bar, which may move it down.

use crate::domain::atr::{calc_atr, AtrSeries};
use crate::domain::error::TrailstopError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Broken,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Broken => write!(f, "broken"),
        }
    }
}

/// Stop state for one bar. `stop` is meaningful only when `valid` is set;
/// bars before the smoothing window fills carry no stop.
#[derive(Debug, Clone, Copy)]
pub struct StopPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub basic_stop: f64,
    pub stop: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone)]
pub struct StopSeries {
    pub period: usize,
    pub multiplier: f64,
    pub atr: AtrSeries,
    pub points: Vec<StopPoint>,
}

impl StopSeries {
    /// Stop price per bar with `0.0` standing in for "no stop defined",
    /// the contract the position simulator consumes.
    pub fn stop_prices(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| if p.valid { p.stop } else { 0.0 })
            .collect()
    }

    /// Latest positive stop value, the "current" trailing stop for display.
    pub fn last_positive_stop(&self) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|p| p.valid && p.stop > 0.0)
            .map(|p| p.stop)
    }

    /// Sub-series starting at `offset`, aligned with `bars[offset..]`.
    pub fn tail(&self, offset: usize) -> StopSeries {
        StopSeries {
            period: self.period,
            multiplier: self.multiplier,
            atr: AtrSeries {
                period: self.atr.period,
                points: self.atr.points[offset..].to_vec(),
            },
            points: self.points[offset..].to_vec(),
        }
    }
}

pub fn calc_trailing_stop(
    bars: &[OhlcvBar],
    period: usize,
    multiplier: f64,
) -> Result<StopSeries, TrailstopError> {
    if period == 0 {
        return Err(TrailstopError::InvalidParameter {
            name: "period".into(),
            reason: "must be at least 1".into(),
        });
    }
    if multiplier <= 0.0 {
        return Err(TrailstopError::InvalidParameter {
            name: "multiplier".into(),
            reason: "must be positive".into(),
        });
    }
    if bars.len() < period {
        return Err(TrailstopError::InsufficientData {
            ticker: bars.first().map(|b| b.ticker.clone()).unwrap_or_default(),
            bars: bars.len(),
            minimum: period,
        });
    }

    let atr = calc_atr(bars, period);
    let basic: Vec<f64> = bars
        .iter()
        .zip(&atr.points)
        .map(|(bar, a)| bar.close - multiplier * a.value)
        .collect();

    // The recurrence is inherently sequential: each stop depends on the
    // previous bar's stop and close.
    let mut points: Vec<StopPoint> = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let point = if i + 1 < period {
            StopPoint {
                date: bar.date,
                valid: false,
                basic_stop: basic[i],
                stop: 0.0,
                trend: Trend::Up,
            }
        } else if i + 1 == period {
            StopPoint {
                date: bar.date,
                valid: true,
                basic_stop: basic[i],
                stop: basic[i],
                trend: Trend::Up,
            }
        } else {
            let prev_stop = points[i - 1].stop;
            let prev_close = bars[i - 1].close;
            let (stop, trend) = if prev_close > prev_stop {
                (prev_stop.max(basic[i]), Trend::Up)
            } else {
                (basic[i], Trend::Broken)
            };
            StopPoint {
                date: bar.date,
                valid: true,
                basic_stop: basic[i],
                stop,
                trend,
            }
        };
        points.push(point);
    }

    Ok(StopSeries {
        period,
        multiplier,
        atr,
        points,
    })
}
