//! Trade-type profiles and the profit-target ladder.

use crate::domain::error::TrailstopError;
use std::fmt;

/// Fraction of the position sold at the first take-profit unless the
/// caller overrides it.
pub const DEFAULT_FIRST_TP_RATIO: f64 = 0.5;

/// How ambitious the trade is. Each type fixes an ATR period, a stop
/// multiplier, and the rule for the first take-profit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeType {
    /// "A": swing for a large move, widest stop.
    Homerun,
    /// "M": medium-term trend.
    MidRange,
    /// "B": quick single, tightest stop.
    Single,
}

impl TradeType {
    pub fn parse(s: &str) -> Result<Self, TrailstopError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(TradeType::Homerun),
            "M" => Ok(TradeType::MidRange),
            "B" => Ok(TradeType::Single),
            other => Err(TrailstopError::InvalidParameter {
                name: "trade_type".into(),
                reason: format!("unknown trade type {other:?}, expected A, M or B"),
            }),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TradeType::Homerun => "A",
            TradeType::MidRange => "M",
            TradeType::Single => "B",
        }
    }

    pub fn atr_period(&self) -> usize {
        match self {
            TradeType::Homerun => 14,
            TradeType::MidRange => 20,
            TradeType::Single => 22,
        }
    }

    pub fn stop_multiplier(&self) -> f64 {
        match self {
            TradeType::Homerun => 3.0,
            TradeType::MidRange => 2.5,
            TradeType::Single => 2.0,
        }
    }

    /// First take-profit price for an entry at `entry_price`.
    ///
    /// Homerun caps a +50% target by 10 ATR above entry, whichever is
    /// closer; the other types are flat percentage targets.
    pub fn first_tp_price(&self, entry_price: f64, current_atr: f64) -> f64 {
        match self {
            TradeType::Homerun => {
                let by_pct = entry_price * 1.50;
                let by_atr = entry_price + 10.0 * current_atr;
                by_pct.min(by_atr)
            }
            TradeType::MidRange => entry_price * 1.275,
            TradeType::Single => entry_price * 1.11,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProfitTargetLevel {
    pub level: u8,
    pub target_price: f64,
    pub pct_from_entry: f64,
    pub atr_multiple: f64,
    pub sell_ratio: f64,
}

/// Five-level ladder: level 1 at `first_tp_price` selling
/// `first_tp_ratio`, levels 2-5 stepped by 10% of entry and each selling
/// a quarter of what remains. The ratios deliberately sum below 1.0; the
/// trailing stop closes out the rest.
pub fn build_profit_targets(
    entry_price: f64,
    first_tp_price: f64,
    current_atr: f64,
    first_tp_ratio: f64,
) -> Vec<ProfitTargetLevel> {
    let increment = entry_price * 0.10;
    let atr_multiple = |price: f64| {
        if current_atr > 0.0 {
            (price - entry_price) / current_atr
        } else {
            0.0
        }
    };

    let mut targets = Vec::with_capacity(5);
    targets.push(ProfitTargetLevel {
        level: 1,
        target_price: first_tp_price,
        pct_from_entry: first_tp_price / entry_price - 1.0,
        atr_multiple: atr_multiple(first_tp_price),
        sell_ratio: first_tp_ratio,
    });

    let mut remaining = 1.0 - first_tp_ratio;
    for level in 2..=5u8 {
        let target_price = first_tp_price + (level - 1) as f64 * increment;
        let sell_ratio = remaining * 0.25;
        targets.push(ProfitTargetLevel {
            level,
            target_price,
            pct_from_entry: target_price / entry_price - 1.0,
            atr_multiple: atr_multiple(target_price),
            sell_ratio,
        });
        remaining -= sell_ratio;
    }

    targets
}
