//! HTTP request handlers for the web adapter.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::ticker_currency;
use crate::domain::analysis::{analyze_series, Analysis, AnalyzeParams, Interval};
use crate::domain::exit_plan::TradeType;
use crate::domain::simulation::ExitStrategy;

use super::{AppState, WebError};

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub ticker: String,
    pub period: Option<usize>,
    pub multiplier: Option<f64>,
    pub days: Option<usize>,
    pub interval: Option<String>,
    pub trade_type: Option<String>,
    pub entry_price: Option<f64>,
    pub entry_date: Option<String>,
    pub first_tp_ratio: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ChartDataPoint {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub stop_price: Option<f64>,
    pub trend: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfitTargetBody {
    pub level: u8,
    pub target_price: f64,
    pub pct_from_entry: f64,
    pub atr_multiple: f64,
    pub sell_ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct PositionSellBody {
    pub date: String,
    pub price: f64,
    pub ratio: f64,
    pub remaining: f64,
    pub level: u8,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct ExitStrategyBody {
    pub trade_type: String,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub first_tp_ratio: f64,
    pub atr_period: usize,
    pub stop_multiplier: f64,
    pub profit_targets: Vec<ProfitTargetBody>,
    pub sells: Vec<PositionSellBody>,
    pub weighted_avg_sell_price: Option<f64>,
    pub total_return_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub ticker: String,
    pub period: usize,
    pub multiplier: f64,
    pub currency: String,
    pub interval: String,
    pub current_atr: f64,
    pub volatility_amount: f64,
    pub data: Vec<ChartDataPoint>,
    pub exit_strategy: Option<ExitStrategyBody>,
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "trailstop API is running" }))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<AnalyzeResponse>, WebError> {
    let params = params_from_query(&query)?;
    let bars = state.data_port.fetch_history(&query.ticker, params.interval)?;
    let analysis = analyze_series(&bars, &params)?;
    Ok(Json(response_from_analysis(&query.ticker, analysis)))
}

fn params_from_query(query: &AnalyzeQuery) -> Result<AnalyzeParams, WebError> {
    let mut params = AnalyzeParams::new(query.ticker.clone());

    if let Some(period) = query.period {
        params.period = period;
    }
    if let Some(multiplier) = query.multiplier {
        params.multiplier = multiplier;
    }
    if let Some(days) = query.days {
        params.days = days;
    }
    if let Some(interval) = &query.interval {
        params.interval = Interval::parse(interval)?;
    }
    if let Some(trade_type) = &query.trade_type {
        params.trade_type = Some(TradeType::parse(trade_type)?);
    }
    params.entry_price = query.entry_price;
    if let Some(entry_date) = &query.entry_date {
        let date = NaiveDate::parse_from_str(entry_date, "%Y-%m-%d").map_err(|_| {
            WebError::bad_request("invalid entry_date format, expected YYYY-MM-DD")
        })?;
        params.entry_date = Some(date);
    }
    params.first_tp_ratio = query.first_tp_ratio;

    Ok(params)
}

fn response_from_analysis(ticker: &str, analysis: Analysis) -> AnalyzeResponse {
    let data = analysis
        .points
        .iter()
        .map(|p| ChartDataPoint {
            date: p.date.format("%Y-%m-%d").to_string(),
            open: p.open,
            high: p.high,
            low: p.low,
            close: p.close,
            volume: p.volume,
            stop_price: p.stop_price,
            trend: p.trend.map(|t| t.to_string()),
        })
        .collect();

    AnalyzeResponse {
        ticker: ticker.to_string(),
        period: analysis.period,
        multiplier: analysis.multiplier,
        currency: ticker_currency(ticker).to_string(),
        interval: analysis.interval.to_string(),
        current_atr: analysis.current_atr,
        volatility_amount: analysis.volatility_amount,
        data,
        exit_strategy: analysis.exit_strategy.map(exit_strategy_body),
    }
}

fn exit_strategy_body(exit: ExitStrategy) -> ExitStrategyBody {
    ExitStrategyBody {
        trade_type: exit.trade_type.code().to_string(),
        entry_price: exit.entry_price,
        stop_loss_price: exit.stop_loss_price,
        first_tp_ratio: exit.first_tp_ratio,
        atr_period: exit.atr_period,
        stop_multiplier: exit.stop_multiplier,
        profit_targets: exit
            .profit_targets
            .iter()
            .map(|t| ProfitTargetBody {
                level: t.level,
                target_price: t.target_price,
                pct_from_entry: t.pct_from_entry,
                atr_multiple: t.atr_multiple,
                sell_ratio: t.sell_ratio,
            })
            .collect(),
        sells: exit
            .sells
            .iter()
            .map(|s| PositionSellBody {
                date: s.date.format("%Y-%m-%d").to_string(),
                price: s.price,
                ratio: s.ratio,
                remaining: s.remaining,
                level: s.level,
                label: s.label.clone(),
            })
            .collect(),
        weighted_avg_sell_price: exit.weighted_avg_sell_price,
        total_return_pct: exit.total_return_pct,
    }
}
