//! Analysis orchestration: stop series, response window, optional exit
//! strategy.

use crate::domain::error::TrailstopError;
use crate::domain::exit_plan::{TradeType, DEFAULT_FIRST_TP_RATIO};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::simulation::{calculate_exit_strategy, ExitStrategy};
use crate::domain::trailing_stop::{calc_trailing_stop, Trend};
use chrono::NaiveDate;
use std::fmt;

/// Bar spacing of the input series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn parse(s: &str) -> Result<Self, TrailstopError> {
        match s {
            "1d" => Ok(Interval::Daily),
            "1wk" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            other => Err(TrailstopError::InvalidParameter {
                name: "interval".into(),
                reason: format!("unknown interval {other:?}, expected 1d, 1wk or 1mo"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }

    /// Approximate bar count per calendar year, used to translate a
    /// calendar-day horizon into a bar count.
    pub fn bars_per_year(&self) -> usize {
        match self {
            Interval::Daily => 252,
            Interval::Weekly => 52,
            Interval::Monthly => 12,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    pub ticker: String,
    pub period: usize,
    pub multiplier: f64,
    /// Calendar days of history to report back.
    pub days: usize,
    pub interval: Interval,
    pub trade_type: Option<TradeType>,
    pub entry_price: Option<f64>,
    pub entry_date: Option<NaiveDate>,
    pub first_tp_ratio: Option<f64>,
}

impl AnalyzeParams {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            period: 14,
            multiplier: 2.5,
            days: 365,
            interval: Interval::Daily,
            trade_type: None,
            entry_price: None,
            entry_date: None,
            first_tp_ratio: None,
        }
    }
}

/// One bar of the response window, with the stop line attached where it
/// is defined.
#[derive(Debug, Clone)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub stop_price: Option<f64>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub ticker: String,
    pub period: usize,
    pub multiplier: f64,
    pub interval: Interval,
    /// Last valid ATR value inside the response window.
    pub current_atr: f64,
    /// ATR times the stop multiplier, the per-bar risk distance.
    pub volatility_amount: f64,
    pub points: Vec<ChartPoint>,
    pub exit_strategy: Option<ExitStrategy>,
}

impl Analysis {
    /// Latest defined stop price in the window.
    pub fn latest_stop(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.stop_price)
    }
}

/// Run the full pipeline over an already-fetched bar sequence.
///
/// The stop series is computed over the whole history, then the response
/// is sliced to the last `days` worth of bars, never fewer than the
/// smoothing window plus a margin. The exit strategy, when requested,
/// simulates over that same window.
pub fn analyze_series(
    bars: &[OhlcvBar],
    params: &AnalyzeParams,
) -> Result<Analysis, TrailstopError> {
    if bars.is_empty() {
        return Err(TrailstopError::NoData {
            ticker: params.ticker.clone(),
        });
    }

    let stops = calc_trailing_stop(bars, params.period, params.multiplier)?;

    let needed = params.days * params.interval.bars_per_year() / 365;
    let keep = needed.max(params.period + 10).min(bars.len());
    let offset = bars.len() - keep;

    let window_bars = &bars[offset..];
    let window_stops = stops.tail(offset);

    let current_atr = window_stops.atr.last_valid().unwrap_or(0.0);

    let points: Vec<ChartPoint> = window_bars
        .iter()
        .zip(&window_stops.points)
        .map(|(bar, sp)| ChartPoint {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            stop_price: (sp.valid && sp.stop > 0.0).then_some(sp.stop),
            trend: sp.valid.then_some(sp.trend),
        })
        .collect();

    let exit_strategy = match (params.trade_type, params.entry_price, params.entry_date) {
        (Some(trade_type), Some(entry_price), Some(entry_date)) => {
            let first_tp_ratio = params.first_tp_ratio.unwrap_or(DEFAULT_FIRST_TP_RATIO);
            Some(calculate_exit_strategy(
                window_bars,
                &window_stops,
                trade_type,
                entry_price,
                entry_date,
                first_tp_ratio,
                current_atr,
            )?)
        }
        _ => None,
    };

    Ok(Analysis {
        ticker: params.ticker.clone(),
        period: params.period,
        multiplier: params.multiplier,
        interval: params.interval,
        current_atr,
        volatility_amount: current_atr * params.multiplier,
        points,
        exit_strategy,
    })
}
