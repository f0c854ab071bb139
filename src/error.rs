use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesPulseError {
    #[error("Spreadsheet is empty")]
    EmptyDataset,

    #[error("Spreadsheet needs at least 3 data columns, found {found}")]
    InsufficientColumns { found: usize },

    #[error("No sales data loaded for analysis")]
    NoDataLoaded,

    #[error("Assistant service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Assistant returned an empty response")]
    EmptyResponse,

    #[error("Invalid month index {0}: must be between 0 and 11")]
    InvalidMonthIndex(usize),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<calamine::Error> for SalesPulseError {
    fn from(err: calamine::Error) -> Self {
        SalesPulseError::Spreadsheet(err.to_string())
    }
}

#[cfg(feature = "llm")]
impl From<reqwest::Error> for SalesPulseError {
    fn from(err: reqwest::Error) -> Self {
        SalesPulseError::UpstreamUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SalesPulseError>;
