use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serial error: {0}")]
    Serial(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
