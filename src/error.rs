use thiserror::Error;

/// Error taxonomy for a sift run.
///
/// `Io`, `Format` and `Network` are fatal unless the configuration says
/// otherwise; per-message parsing problems never surface here, they degrade
/// to warnings on the run report.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive format error: {0}")]
    Format(String),

    #[error("exclusion service error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SiftError {
    fn from(err: reqwest::Error) -> Self {
        SiftError::Network(err.to_string())
    }
}

impl From<csv::Error> for SiftError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => SiftError::Io(io),
            _ => SiftError::Io(std::io::Error::new(std::io::ErrorKind::Other, message)),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiftError>;
