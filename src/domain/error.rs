//! Domain error types.

/// Top-level error type for trailstop.
#[derive(Debug, thiserror::Error)]
pub enum TrailstopError {
    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrailstopError> for std::process::ExitCode {
    fn from(err: &TrailstopError) -> Self {
        let code: u8 = match err {
            TrailstopError::Io(_) => 1,
            TrailstopError::ConfigParse { .. }
            | TrailstopError::ConfigMissing { .. }
            | TrailstopError::ConfigInvalid { .. } => 2,
            TrailstopError::Data { .. } => 3,
            TrailstopError::InvalidParameter { .. } => 4,
            TrailstopError::NoData { .. } | TrailstopError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = TrailstopError::InsufficientData {
            ticker: "AAPL".into(),
            bars: 5,
            minimum: 14,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for AAPL: have 5 bars, need 14"
        );
    }

    #[test]
    fn invalid_parameter_message() {
        let err = TrailstopError::InvalidParameter {
            name: "multiplier".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(err.to_string(), "invalid parameter multiplier: must be positive");
    }
}
