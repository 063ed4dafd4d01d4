use thiserror::Error;

/// Faults raised by the ETL stages. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("failed to fetch {url}: HTTP {status}")]
    Transport { url: String, status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid CSS selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("no element matching {selector:?} in document")]
    MissingTable { selector: String },

    #[error("exchange-rate file is missing required column {missing:?}")]
    RateSchema { missing: &'static str },

    #[error("invalid exchange rate for {code}: {value:?}")]
    InvalidRate { code: String, value: String },

    #[error("currency {code} listed more than once in exchange-rate data")]
    DuplicateCurrency { code: String },

    #[error("currency {code} not found in exchange-rate data")]
    CurrencyLookup { code: &'static str },

    #[error("table row {row} has {cells} cells, expected {expected}")]
    MalformedRow {
        row: usize,
        cells: usize,
        expected: usize,
    },

    #[error("row {row}: cannot convert {column} value {value:?} to a number")]
    Coercion {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: duplicate rank {rank}")]
    DuplicateRank { row: usize, rank: u32 },

    #[error("no database at {path}; run the pipeline first")]
    MissingDatabase { path: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("chart rendering failed: {0}")]
    Chart(String),
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
