
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulemapError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, RulemapError>;

// Helper conversions
impl From<config::ConfigError> for RulemapError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

impl From<std::io::Error> for RulemapError {
    fn from(e: std::io::Error) -> Self { Self::Execution(e.to_string()) }
}
