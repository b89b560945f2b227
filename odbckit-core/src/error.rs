//! Error types for the connectivity layer.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Convenience alias for a boxed error.
pub type BoxDynError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all the ways a method can fail within the toolkit.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error occurred while parsing a connection string or other configuration.
    #[error("error with configuration: {0}")]
    Configuration(#[source] BoxDynError),

    /// Error returned from the ODBC driver manager or the driver itself.
    #[error("error returned from the driver: {0}")]
    Database(#[from] OdbcDatabaseError),

    /// Error communicating with the operating system.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Unexpected or invalid data encountered while communicating with the driver.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(String),

    /// No rows returned by a query that expected to return at least one row.
    #[error("no rows returned by a query that expected to return at least one row")]
    RowNotFound,

    /// Column index was out of bounds.
    #[error("column index out of bounds: the len is {len}, but the index is {index}")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    /// No column found with the given name.
    #[error("no column found for name: {0}")]
    ColumnNotFound(String),

    /// Error occurred while decoding a value from a specific column.
    #[error("error occurred while decoding column {index}: {source}")]
    ColumnDecode {
        index: String,

        #[source]
        source: BoxDynError,
    },

    /// A DBMS name that no dialect in the registry covers.
    #[error("unsupported DBMS: {0}")]
    UnsupportedDbms(String),

    /// The database never accepted a connection within the retry budget.
    #[error("database did not accept a connection after {attempts} attempts")]
    StartupTimeout {
        attempts: u32,

        #[source]
        source: Box<Error>,
    },

    /// A prepared statement handle that is no longer open on this connection.
    #[error("prepared statement {0} is not open on this connection")]
    StatementClosed(u64),

    /// The background worker that owns the driver handle has exited.
    #[error("attempted to communicate with a crashed connection worker")]
    WorkerCrashed,
}

/// An error reported by the ODBC driver, with the diagnostic record text
/// produced by `odbc-api`.
#[derive(Debug)]
pub struct OdbcDatabaseError(pub odbc_api::Error);

impl OdbcDatabaseError {
    /// The primary, human-readable error message.
    pub fn message(&self) -> String {
        self.0.to_string()
    }
}

impl Display for OdbcDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for OdbcDatabaseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

impl From<odbc_api::Error> for Error {
    fn from(error: odbc_api::Error) -> Self {
        Error::Database(OdbcDatabaseError(error))
    }
}
