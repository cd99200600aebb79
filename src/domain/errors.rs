use derive_more::Display;

/// Every fallible operation in the chart core reports one of these.
///
/// Indicator math, slicing and pointer handling are total and never produce
/// an error; only configuration, data ingestion and surface access do.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ChartError {
    #[display(fmt = "Symbol cannot be empty")]
    EmptySymbol,
    #[display(fmt = "Bar {} violates OHLC bounds or is not finite", index)]
    InvalidBar { index: usize },
    #[display(fmt = "Bar {} is not strictly after its predecessor", index)]
    NonMonotonicTime { index: usize },
    #[display(fmt = "Unknown window length: {}", _0)]
    UnknownWindow(String),
    #[display(fmt = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[display(fmt = "Surface error: {}", _0)]
    Surface(String),
    #[display(fmt = "Data source error: {}", _0)]
    DataSource(String),
}

impl std::error::Error for ChartError {}

impl From<serde_json::Error> for ChartError {
    fn from(error: serde_json::Error) -> Self {
        ChartError::InvalidConfig(error.to_string())
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
