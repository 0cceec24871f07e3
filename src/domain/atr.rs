//! True range series and exponential ATR smoothing.
//!
//! alpha = 1/period, seeded at the first bar with the undefined initial
//! true range contributing zero. Warmup: the first (period-1) points are
//! invalid.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Per-bar true range. The first element is `None`: without a previous
/// close the gap terms are undefined.
pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                None
            } else {
                Some(bar.true_range(bars[i - 1].close))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct AtrPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct AtrSeries {
    pub period: usize,
    pub points: Vec<AtrPoint>,
}

impl AtrSeries {
    /// Most recent valid ATR value, if the window ever filled.
    pub fn last_valid(&self) -> Option<f64> {
        self.points.iter().rev().find(|p| p.valid).map(|p| p.value)
    }
}

pub fn calc_atr(bars: &[OhlcvBar], period: usize) -> AtrSeries {
    if period == 0 || bars.is_empty() {
        return AtrSeries {
            period,
            points: Vec::new(),
        };
    }

    let trs = true_ranges(bars);
    let alpha = 1.0 / period as f64;
    let mut points = Vec::with_capacity(bars.len());

    let mut atr = trs[0].unwrap_or(0.0);
    points.push(AtrPoint {
        date: bars[0].date,
        valid: period == 1,
        value: atr,
    });

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let tr = trs[i].unwrap_or(0.0);
        atr = alpha * tr + (1.0 - alpha) * atr;
        points.push(AtrPoint {
            date: bar.date,
            valid: i >= period - 1,
            value: atr,
        });
    }

    AtrSeries { period, points }
}
