//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "web")]
pub mod web;

/// Korean-market convention: an all-digit ticker resolves to the KOSPI
/// listing.
pub fn normalize_ticker(ticker: &str) -> String {
    let trimmed = ticker.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{trimmed}.KS")
    } else {
        trimmed.to_uppercase()
    }
}

/// KRX tickers (numeric or `.KS`/`.KQ` suffixed) settle in KRW,
/// everything else is reported as USD.
pub fn ticker_currency(ticker: &str) -> &'static str {
    let upper = ticker.trim().to_uppercase();
    if upper.ends_with(".KS")
        || upper.ends_with(".KQ")
        || (!upper.is_empty() && upper.chars().all(|c| c.is_ascii_digit()))
    {
        "KRW"
    } else {
        "USD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ticker_maps_to_kospi() {
        assert_eq!(normalize_ticker("005930"), "005930.KS");
    }

    #[test]
    fn alpha_ticker_uppercased() {
        assert_eq!(normalize_ticker("aapl"), "AAPL");
        assert_eq!(normalize_ticker("005930.ks"), "005930.KS");
    }

    #[test]
    fn currency_classification() {
        assert_eq!(ticker_currency("AAPL"), "USD");
        assert_eq!(ticker_currency("TSLA"), "USD");
        assert_eq!(ticker_currency("005930"), "KRW");
        assert_eq!(ticker_currency("005930.KS"), "KRW");
        assert_eq!(ticker_currency("035720.kq"), "KRW");
    }
}
