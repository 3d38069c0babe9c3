// Error types for the zroute client

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum ZrouteError {
    #[error("{0}")]
    Usage(String),

    #[error("missing value after `{0}`")]
    MissingValue(String),

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("invalid prefix length `{0}`")]
    InvalidPrefixLength(String),

    #[error("missing prefix length, give TARGET/LEN, netmask MASK, -host or default")]
    MissingPrefixLength,

    #[error("missing operation, expected `add` or `del`")]
    MissingOperation,

    #[error("failed connecting to zebra routing daemon at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed {op} route, ret:{code}")]
    RouteRequest { op: &'static str, code: i32 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using ZrouteError
pub type ZrouteResult<T> = Result<T, ZrouteError>;

impl ZrouteError {
    /// Errors caused by a malformed command line; these are followed by the usage text
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ZrouteError::Usage(_)
                | ZrouteError::MissingValue(_)
                | ZrouteError::UnexpectedToken(_)
                | ZrouteError::InvalidPrefixLength(_)
                | ZrouteError::MissingPrefixLength
                | ZrouteError::MissingOperation
        )
    }

    /// Process exit status. Every failure class maps to 1, none are retried.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl From<anyhow::Error> for ZrouteError {
    fn from(err: anyhow::Error) -> Self {
        ZrouteError::Config(format!("{err:#}"))
    }
}
