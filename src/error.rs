//! Error types for utmkit

use std::fmt;
use std::io;

use crate::projection::flags::{TmFlags, UtmFlags};

/// Result type for utmkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in utmkit operations
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// CSV reading or writing error
    Csv(csv::Error),

    /// Malformed input that never reached a converter
    InvalidInput(String),

    /// Transverse Mercator conversion rejected the input
    TransverseMercator { flags: TmFlags },

    /// UTM conversion rejected the input
    Utm { flags: UtmFlags },
}

impl Error {
    /// Returns the Transverse Mercator flags carried by this error, if any
    pub fn tm_flags(&self) -> Option<TmFlags> {
        match self {
            Error::TransverseMercator { flags } => Some(*flags),
            _ => None,
        }
    }

    /// Returns the UTM flags carried by this error, if any
    pub fn utm_flags(&self) -> Option<UtmFlags> {
        match self {
            Error::Utm { flags } => Some(*flags),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Csv(e) => write!(f, "CSV error: {}", e),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::TransverseMercator { flags } => {
                write!(f, "Transverse Mercator conversion error: {}", flags.describe())
            }
            Error::Utm { flags } => write!(f, "UTM conversion error: {}", flags.describe()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Error::Csv(error)
    }
}
