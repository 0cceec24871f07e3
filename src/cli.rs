//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::ticker_currency;
use crate::domain::analysis::{analyze_series, Analysis, AnalyzeParams, Interval};
use crate::domain::error::TrailstopError;
use crate::domain::exit_plan::TradeType;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "trailstop", about = "ATR trailing stop analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a ticker: trailing stop line plus optional exit plan
    Analyze {
        #[arg(long)]
        ticker: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        period: Option<usize>,
        #[arg(long)]
        multiplier: Option<f64>,
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        interval: Option<String>,
        /// Trade type for the exit plan: A, M or B
        #[arg(long)]
        trade_type: Option<String>,
        #[arg(long)]
        entry_price: Option<f64>,
        /// Entry date, YYYY-MM-DD
        #[arg(long)]
        entry_date: Option<String>,
        #[arg(long)]
        first_tp_ratio: Option<f64>,
    },
    /// Show the available data range for ticker(s)
    Info {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List tickers available in the data directory
    ListSymbols {
        #[arg(long)]
        interval: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            ticker,
            config,
            data_dir,
            period,
            multiplier,
            days,
            interval,
            trade_type,
            entry_price,
            entry_date,
            first_tp_ratio,
        } => run_analyze(AnalyzeArgs {
            ticker,
            config,
            data_dir,
            period,
            multiplier,
            days,
            interval,
            trade_type,
            entry_price,
            entry_date,
            first_tp_ratio,
        }),
        Command::Info {
            ticker,
            interval,
            config,
            data_dir,
        } => run_info(ticker.as_deref(), interval.as_deref(), config.as_ref(), data_dir),
        Command::ListSymbols {
            interval,
            config,
            data_dir,
        } => run_list_symbols(interval.as_deref(), config.as_ref(), data_dir),
        Command::Serve { config } => run_serve(&config),
    }
}

pub struct AnalyzeArgs {
    pub ticker: String,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub period: Option<usize>,
    pub multiplier: Option<f64>,
    pub days: Option<usize>,
    pub interval: Option<String>,
    pub trade_type: Option<String>,
    pub entry_price: Option<f64>,
    pub entry_date: Option<String>,
    pub first_tp_ratio: Option<f64>,
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TrailstopError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    match path {
        Some(p) => load_config(p).map(Some),
        None => Ok(None),
    }
}

/// Flag beats config file beats built-in default.
pub fn resolve_params(
    args: &AnalyzeArgs,
    config: Option<&dyn ConfigPort>,
) -> Result<AnalyzeParams, TrailstopError> {
    let mut params = AnalyzeParams::new(args.ticker.clone());

    params.period = args.period.unwrap_or_else(|| {
        config.map_or(14, |c| c.get_int("analyze", "period", 14).max(0) as usize)
    });
    params.multiplier = args
        .multiplier
        .unwrap_or_else(|| config.map_or(2.5, |c| c.get_double("analyze", "multiplier", 2.5)));
    params.days = args.days.unwrap_or_else(|| {
        config.map_or(365, |c| c.get_int("analyze", "days", 365).max(0) as usize)
    });

    let interval_str = args
        .interval
        .clone()
        .or_else(|| config.and_then(|c| c.get_string("analyze", "interval")));
    if let Some(s) = interval_str {
        params.interval = Interval::parse(&s)?;
    }

    if let Some(s) = &args.trade_type {
        params.trade_type = Some(TradeType::parse(s)?);
    }
    params.entry_price = args.entry_price;
    if let Some(s) = &args.entry_date {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            TrailstopError::InvalidParameter {
                name: "entry_date".into(),
                reason: "expected YYYY-MM-DD".into(),
            }
        })?;
        params.entry_date = Some(date);
    }
    params.first_tp_ratio = args.first_tp_ratio;

    Ok(params)
}

fn resolve_data_dir(
    data_dir: Option<PathBuf>,
    config: Option<&dyn ConfigPort>,
) -> Result<PathBuf, ExitCode> {
    if let Some(dir) = data_dir {
        return Ok(dir);
    }
    if let Some(dir) = config.and_then(|c| c.get_string("data", "dir")) {
        return Ok(PathBuf::from(dir));
    }
    eprintln!("error: data directory is required (use --data-dir or set [data] dir in config)");
    Err(ExitCode::from(2))
}

fn run_analyze(args: AnalyzeArgs) -> ExitCode {
    let config = match load_optional_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    let params = match resolve_params(&args, config_port) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_dir = match resolve_data_dir(args.data_dir.clone(), config_port) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let data_port = CsvAdapter::new(data_dir);

    eprintln!("Fetching {} ({} bars)...", args.ticker, params.interval);
    let bars = match data_port.fetch_history(&args.ticker, params.interval) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Analyzing {} bars", bars.len());

    let analysis = match analyze_series(&bars, &params) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_analysis(&args.ticker, &analysis);
    ExitCode::SUCCESS
}

fn print_analysis(ticker: &str, analysis: &Analysis) {
    let currency = ticker_currency(ticker);

    eprintln!("\n=== Trailing Stop ===");
    eprintln!("Ticker:           {} ({})", ticker, currency);
    eprintln!(
        "Parameters:       ATR({}) x {:.2}, {} interval",
        analysis.period, analysis.multiplier, analysis.interval
    );
    eprintln!("Current ATR:      {:.2}", analysis.current_atr);
    eprintln!("Volatility:       {:.2}", analysis.volatility_amount);
    match analysis.latest_stop() {
        Some(stop) => eprintln!("Latest stop:      {:.2}", stop),
        None => eprintln!("Latest stop:      not yet defined"),
    }
    eprintln!("Window:           {} bars", analysis.points.len());

    let Some(exit) = &analysis.exit_strategy else {
        return;
    };

    eprintln!("\n=== Exit Plan ({}) ===", exit.trade_type);
    eprintln!("Entry price:      {:.2}", exit.entry_price);
    eprintln!("Stop-loss:        {:.2}", exit.stop_loss_price);
    eprintln!(
        "Profile:          ATR({}) x {:.2}",
        exit.atr_period, exit.stop_multiplier
    );

    println!("level,target_price,pct_from_entry,atr_multiple,sell_ratio");
    for t in &exit.profit_targets {
        println!(
            "{},{:.2},{:.4},{:.2},{:.6}",
            t.level, t.target_price, t.pct_from_entry, t.atr_multiple, t.sell_ratio
        );
    }

    if exit.sells.is_empty() {
        eprintln!("\nNo sells triggered in the simulated window.");
    } else {
        eprintln!("\nSimulated sells:");
        for s in &exit.sells {
            eprintln!(
                "  {}  {:<18} ratio {:.4}  remaining {:.4}",
                s.date, s.label, s.ratio, s.remaining
            );
        }
    }
    if let (Some(avg), Some(ret)) = (exit.weighted_avg_sell_price, exit.total_return_pct) {
        eprintln!("Weighted avg sell: {:.2}", avg);
        eprintln!("Total return:      {:.2}%", ret);
    }
}

fn run_info(
    ticker: Option<&str>,
    interval: Option<&str>,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    let interval = match parse_interval_arg(interval) {
        Ok(i) => i,
        Err(code) => return code,
    };
    let data_dir = match resolve_data_dir(data_dir, config_port) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let data_port = CsvAdapter::new(data_dir);

    let tickers: Vec<String> = match ticker {
        Some(t) => vec![t.to_string()],
        None => match data_port.list_symbols(interval) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    for t in &tickers {
        match data_port.data_range(t, interval) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", t, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", t);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", t, e);
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_list_symbols(
    interval: Option<&str>,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    let interval = match parse_interval_arg(interval) {
        Ok(i) => i,
        Err(code) => return code,
    };
    let data_dir = match resolve_data_dir(data_dir, config_port) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let data_port = CsvAdapter::new(data_dir);

    let symbols = match data_port.list_symbols(interval) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn parse_interval_arg(interval: Option<&str>) -> Result<Interval, ExitCode> {
    match interval {
        None => Ok(Interval::Daily),
        Some(s) => Interval::parse(s).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }),
    }
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use std::net::SocketAddr;
        use std::sync::Arc;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let data_port = match CsvAdapter::from_config(&config) {
            Ok(a) => Arc::new(a) as Arc<dyn DataPort + Send + Sync>,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let addr: SocketAddr = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:8000".parse().unwrap());

        eprintln!("Starting web server on {}", addr);

        let router = build_router(AppState { data_port });

        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(async {
                let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
                axum::serve(listener, router).await.unwrap();
            });

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
