//! odbckit is an asynchronous toolkit for working with databases through
//! their ODBC drivers.
//!
//! The crate re-exports the connectivity layer of [`odbckit_core`]. The
//! companion `odbckit` command-line tool builds on the same layer to
//! prepare scratch databases, probe server versions, run sqllogictest
//! suites and benchmark insertion strategies.
//!
//! ```no_run
//! use odbckit::OdbcConnection;
//!
//! # async fn run() -> Result<(), odbckit::Error> {
//! let mut conn = OdbcConnection::connect("DSN=MyDataSource").await?;
//! let row = conn.fetch_one("SELECT 1").await?;
//! assert_eq!(row.try_get_i64(0)?, Some(1));
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(future_incompatible, rust_2018_idioms)]

pub use odbckit_core::arguments::{OdbcArgumentValue, OdbcArguments};
pub use odbckit_core::column::OdbcColumn;
pub use odbckit_core::connection::OdbcConnection;
pub use odbckit_core::dialect::{Dialect, SqlType};
pub use odbckit_core::error::{BoxDynError, Error, OdbcDatabaseError, Result};
pub use odbckit_core::options::OdbcConnectOptions;
pub use odbckit_core::query_result::OdbcQueryResult;
pub use odbckit_core::row::{OdbcRow, RowIndex};
pub use odbckit_core::statement::OdbcStatement;
pub use odbckit_core::type_info::OdbcTypeInfo;
pub use odbckit_core::value::OdbcValue;
