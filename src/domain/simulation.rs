//! Forward position walk: partial sells at profit targets, full exit at
//! the trailing stop.

use crate::domain::error::TrailstopError;
use crate::domain::exit_plan::{build_profit_targets, ProfitTargetLevel, TradeType};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::trailing_stop::StopSeries;
use chrono::NaiveDate;

/// Fractions at or below this are treated as a fully closed position,
/// absorbing floating-point residue from repeated ratio subtraction.
pub const MIN_REMAINING: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct PositionSell {
    pub date: NaiveDate,
    pub price: f64,
    /// Fraction of the original position sold here.
    pub ratio: f64,
    /// Fraction of the original position still held afterwards.
    pub remaining: f64,
    /// 0 for the stop-loss, 1-5 for profit-target levels.
    pub level: u8,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ExitStrategy {
    pub trade_type: TradeType,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub first_tp_ratio: f64,
    /// Profile defaults, reported for reference; the stop series is not
    /// recomputed with them.
    pub atr_period: usize,
    pub stop_multiplier: f64,
    pub profit_targets: Vec<ProfitTargetLevel>,
    pub sells: Vec<PositionSell>,
    pub weighted_avg_sell_price: Option<f64>,
    pub total_return_pct: Option<f64>,
}

/// Walk bars from the first date at or past `entry_date`, selling at
/// profit targets and the stop.
///
/// `stop_prices` is index-aligned with `bars`; values `<= 0.0` mean no
/// stop is defined for that bar. The stop-loss is checked before profit
/// targets, so a bar spanning both exits everything at the stop price. A
/// bar whose high spans several targets sells at each of them in order.
/// An entry date past all data yields an empty walk, not an error.
pub fn simulate_position_sizing(
    bars: &[OhlcvBar],
    entry_date: NaiveDate,
    targets: &[ProfitTargetLevel],
    stop_prices: &[f64],
) -> Vec<PositionSell> {
    let mut sells = Vec::new();
    let Some(start) = bars.iter().position(|b| b.date >= entry_date) else {
        return sells;
    };

    let mut remaining = 1.0_f64;
    let mut cursor = 0usize;

    for (bar, &stop) in bars[start..].iter().zip(&stop_prices[start..]) {
        if remaining <= MIN_REMAINING {
            break;
        }

        if stop > 0.0 && bar.low <= stop {
            sells.push(PositionSell {
                date: bar.date,
                price: stop,
                ratio: remaining,
                remaining: 0.0,
                level: 0,
                label: format!("Stop-loss @ {stop:.2}"),
            });
            break;
        }

        while cursor < targets.len() && remaining > MIN_REMAINING {
            let target = &targets[cursor];
            if bar.high < target.target_price {
                break;
            }
            let ratio = target.sell_ratio.min(remaining);
            remaining -= ratio;
            sells.push(PositionSell {
                date: bar.date,
                price: target.target_price,
                ratio,
                remaining,
                level: target.level,
                label: format!("TP{} @ {:.2}", target.level, target.target_price),
            });
            cursor += 1;
        }
    }

    sells
}

/// Build the full exit strategy: resolve the first take-profit from the
/// trade type, lay the ladder, simulate the walk, and summarize.
pub fn calculate_exit_strategy(
    bars: &[OhlcvBar],
    stops: &StopSeries,
    trade_type: TradeType,
    entry_price: f64,
    entry_date: NaiveDate,
    first_tp_ratio: f64,
    current_atr: f64,
) -> Result<ExitStrategy, TrailstopError> {
    if entry_price <= 0.0 {
        return Err(TrailstopError::InvalidParameter {
            name: "entry_price".into(),
            reason: "must be positive".into(),
        });
    }
    if first_tp_ratio <= 0.0 || first_tp_ratio > 1.0 {
        return Err(TrailstopError::InvalidParameter {
            name: "first_tp_ratio".into(),
            reason: "must be in (0, 1]".into(),
        });
    }

    let first_tp_price = trade_type.first_tp_price(entry_price, current_atr);
    let targets = build_profit_targets(entry_price, first_tp_price, current_atr, first_tp_ratio);
    let stop_prices = stops.stop_prices();
    let sells = simulate_position_sizing(bars, entry_date, &targets, &stop_prices);

    let total_sold: f64 = sells.iter().map(|s| s.ratio).sum();
    let weighted_avg_sell_price = if total_sold > 0.0 {
        let weighted: f64 = sells.iter().map(|s| s.price * s.ratio).sum();
        Some(weighted / total_sold)
    } else {
        None
    };
    let total_return_pct = weighted_avg_sell_price.map(|avg| (avg / entry_price - 1.0) * 100.0);

    // Report the latest ratchet value as the current stop; fall back to a
    // synthetic one when the series never produced a positive stop.
    let stop_loss_price = stops
        .last_positive_stop()
        .unwrap_or(entry_price - current_atr * stops.multiplier);

    Ok(ExitStrategy {
        trade_type,
        entry_price,
        stop_loss_price,
        first_tp_ratio,
        atr_period: trade_type.atr_period(),
        stop_multiplier: trade_type.stop_multiplier(),
        profit_targets: targets,
        sells,
        weighted_avg_sell_price,
        total_return_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(day as i64)
    }

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: "TEST".into(),
            date: date(day),
            open,
            high,
            low,
            close,
            volume: 1_000_000,
        }
    }

    fn target(level: u8, price: f64, sell_ratio: f64) -> ProfitTargetLevel {
        ProfitTargetLevel {
            level,
            target_price: price,
            pct_from_entry: 0.0,
            atr_multiple: 0.0,
            sell_ratio,
        }
    }

    #[test]
    fn no_sells_when_price_stays_flat() {
        let bars = vec![
            bar(0, 100.0, 105.0, 95.0, 100.0),
            bar(1, 100.0, 105.0, 95.0, 100.0),
            bar(2, 100.0, 105.0, 95.0, 100.0),
        ];
        let targets = vec![target(1, 150.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[0.0, 0.0, 0.0]);
        assert!(sells.is_empty());
    }

    #[test]
    fn stop_loss_sells_everything() {
        let bars = vec![
            bar(0, 100.0, 105.0, 95.0, 100.0),
            bar(1, 100.0, 102.0, 89.0, 90.0),
        ];
        let targets = vec![target(1, 150.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[90.0, 90.0]);

        assert_eq!(sells.len(), 1);
        let sell = &sells[0];
        assert_eq!(sell.level, 0);
        assert_relative_eq!(sell.price, 90.0);
        assert_relative_eq!(sell.ratio, 1.0);
        assert_eq!(sell.remaining, 0.0);
        assert!(sell.label.starts_with("Stop-loss"));
    }

    #[test]
    fn first_target_sells_configured_ratio() {
        let bars = vec![
            bar(0, 100.0, 105.0, 95.0, 100.0),
            bar(1, 100.0, 155.0, 100.0, 150.0),
        ];
        let targets = vec![target(1, 150.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[80.0, 80.0]);

        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].level, 1);
        assert_relative_eq!(sells[0].ratio, 0.5);
        assert_relative_eq!(sells[0].remaining, 0.5);
        assert_relative_eq!(sells[0].price, 150.0);
    }

    #[test]
    fn stop_beats_target_on_same_bar() {
        // high reaches the 150 target and low breaches the 90 stop
        let bars = vec![bar(0, 100.0, 160.0, 85.0, 100.0)];
        let targets = vec![target(1, 150.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[90.0]);

        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].level, 0);
        assert_relative_eq!(sells[0].price, 90.0);
    }

    #[test]
    fn one_bar_can_sweep_several_targets() {
        let bars = vec![bar(0, 100.0, 200.0, 95.0, 190.0)];
        let targets = vec![target(1, 120.0, 0.5), target(2, 140.0, 0.125)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[80.0]);

        assert_eq!(sells.len(), 2);
        assert_eq!(sells[0].level, 1);
        assert_relative_eq!(sells[0].price, 120.0);
        assert_eq!(sells[1].level, 2);
        assert_relative_eq!(sells[1].price, 140.0);
        assert_relative_eq!(sells[1].remaining, 0.375);
    }

    #[test]
    fn bars_before_entry_date_are_skipped() {
        let bars = vec![
            bar(0, 100.0, 200.0, 95.0, 100.0),
            bar(1, 100.0, 105.0, 95.0, 100.0),
        ];
        let targets = vec![target(1, 150.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(1), &targets, &[0.0, 0.0]);
        assert!(sells.is_empty());
    }

    #[test]
    fn entry_date_after_all_data_yields_empty_walk() {
        let bars = vec![bar(0, 100.0, 200.0, 95.0, 100.0)];
        let targets = vec![target(1, 150.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(100), &targets, &[0.0]);
        assert!(sells.is_empty());
    }

    #[test]
    fn remaining_is_non_increasing_and_ends_at_zero_on_stop() {
        let bars = vec![
            bar(0, 100.0, 125.0, 95.0, 120.0),
            bar(1, 120.0, 145.0, 115.0, 140.0),
            bar(2, 140.0, 142.0, 100.0, 105.0),
        ];
        let targets = vec![target(1, 120.0, 0.5), target(2, 140.0, 0.125)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[0.0, 0.0, 110.0]);

        assert_eq!(sells.len(), 3);
        assert_relative_eq!(sells[0].remaining, 0.5);
        assert_relative_eq!(sells[1].remaining, 0.375);
        assert_eq!(sells[2].remaining, 0.0);
        assert_relative_eq!(sells[2].ratio, 0.375);
        assert_eq!(sells[2].level, 0);

        for pair in sells.windows(2) {
            assert!(pair[1].remaining <= pair[0].remaining);
        }
    }

    #[test]
    fn sell_ratio_capped_by_remaining() {
        // two targets configured to oversell: 0.9 then 0.5
        let bars = vec![bar(0, 100.0, 200.0, 95.0, 190.0)];
        let targets = vec![target(1, 120.0, 0.9), target(2, 140.0, 0.5)];
        let sells = simulate_position_sizing(&bars, date(0), &targets, &[0.0]);

        assert_eq!(sells.len(), 2);
        assert_relative_eq!(sells[0].ratio, 0.9);
        assert_relative_eq!(sells[1].ratio, 0.1, epsilon = 1e-12);
        assert_relative_eq!(sells[1].remaining, 0.0, epsilon = 1e-12);
    }

    mod exit_strategy {
        use super::*;
        use crate::domain::trailing_stop::calc_trailing_stop;

        fn rising_bars(days: usize) -> Vec<OhlcvBar> {
            (0..days)
                .map(|i| {
                    let close = 100.0 + i as f64 * 2.0;
                    bar(i as u32, close - 0.5, close + 3.0, close - 1.0, close)
                })
                .collect()
        }

        fn dropping_bars(days: usize) -> Vec<OhlcvBar> {
            (0..days)
                .map(|i| {
                    let close = 100.0 - i as f64 * 2.0;
                    bar(i as u32, close + 0.5, close + 1.0, close - 3.0, close)
                })
                .collect()
        }

        #[test]
        fn flat_series_produces_no_sells() {
            // constant close, target far above: nothing ever triggers
            let bars: Vec<OhlcvBar> = (0..30)
                .map(|i| bar(i as u32, 100.0, 105.0, 95.0, 100.0))
                .collect();
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::Homerun,
                100.0,
                date(0),
                0.5,
                10.0,
            )
            .unwrap();
            assert!(result.sells.is_empty());
            assert!(result.weighted_avg_sell_price.is_none());
            assert!(result.total_return_pct.is_none());
        }

        #[test]
        fn rejects_non_positive_entry_price() {
            let bars = rising_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            let err = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::Single,
                0.0,
                date(0),
                0.5,
                3.0,
            )
            .unwrap_err();
            assert!(matches!(err, TrailstopError::InvalidParameter { .. }));
        }

        #[test]
        fn rejects_out_of_range_first_tp_ratio() {
            let bars = rising_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            for ratio in [0.0, -0.5, 1.5] {
                assert!(calculate_exit_strategy(
                    &bars,
                    &stops,
                    TradeType::Single,
                    100.0,
                    date(0),
                    ratio,
                    3.0,
                )
                .is_err());
            }
        }

        #[test]
        fn stop_loss_price_is_latest_ratchet_value() {
            let bars = rising_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::MidRange,
                100.0,
                date(0),
                0.5,
                5.0,
            )
            .unwrap();
            assert_relative_eq!(
                result.stop_loss_price,
                stops.last_positive_stop().unwrap()
            );
        }

        #[test]
        fn no_sells_yields_no_averages() {
            let bars = rising_bars(20);
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            // entry after all data: the walk never starts
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::Homerun,
                100.0,
                date(100),
                0.5,
                5.0,
            )
            .unwrap();
            assert!(result.sells.is_empty());
            assert!(result.weighted_avg_sell_price.is_none());
            assert!(result.total_return_pct.is_none());
        }

        #[test]
        fn rising_market_hits_first_target() {
            let bars = rising_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.0).unwrap();
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::Single,
                100.0,
                date(0),
                0.5,
                3.0,
            )
            .unwrap();
            assert_relative_eq!(result.profit_targets[0].target_price, 111.0);
            assert!(!result.sells.is_empty());
            assert!(result.sells[0].level >= 1);
        }

        #[test]
        fn dropping_market_ends_with_stop_loss() {
            let bars = dropping_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::MidRange,
                100.0,
                date(14),
                0.5,
                5.0,
            )
            .unwrap();
            assert!(!result.sells.is_empty());
            assert_eq!(result.sells.last().unwrap().level, 0);
        }

        #[test]
        fn total_return_matches_weighted_average() {
            let bars = rising_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.0).unwrap();
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::Single,
                100.0,
                date(0),
                0.5,
                3.0,
            )
            .unwrap();
            let avg = result.weighted_avg_sell_price.unwrap();
            let expected = (avg / 100.0 - 1.0) * 100.0;
            assert_relative_eq!(result.total_return_pct.unwrap(), expected, epsilon = 1e-9);
        }

        #[test]
        fn profile_defaults_are_reported() {
            let bars = rising_bars(30);
            let stops = calc_trailing_stop(&bars, 14, 2.5).unwrap();
            let result = calculate_exit_strategy(
                &bars,
                &stops,
                TradeType::Homerun,
                100.0,
                date(0),
                0.5,
                5.0,
            )
            .unwrap();
            assert_eq!(result.atr_period, 14);
            assert_relative_eq!(result.stop_multiplier, 3.0);
        }
    }
}
