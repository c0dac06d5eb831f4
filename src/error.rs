use thiserror::Error;

/// Failures talking to the market-data provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("market data request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("market data provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid market data api key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
}

/// Failures reading from or writing to the history store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("coin {coin_id} is missing required field `{field}`")]
    MissingField { coin_id: String, field: &'static str },

    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    Empty { name: &'static str },

    #[error("DATABASE_URL must be a sqlite connection string, got `{0}`")]
    UnsupportedDatabase(String),

    #[error("PORT must be a number between 1 and 65535, got `{0}`")]
    InvalidPort(String),

    #[error("COINGECKO_API_URL must be an http(s) URL, got `{0}`")]
    InvalidApiUrl(String),

    #[error("COINGECKO_API_KEY is not a valid header value")]
    InvalidApiKey,
}
