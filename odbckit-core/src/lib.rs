//! Core of odbckit: an asynchronous connectivity layer over ODBC.
//!
//! A connection string in any standard ODBC form opens an
//! [`OdbcConnection`]:
//!
//! - `DSN=MyDataSource;UID=user;PWD=secret`
//! - `Driver={PostgreSQL UNICODE};Server=localhost;Database=test`
//! - `FILEDSN=/path/to/file.dsn`
//! - a bare DSN name such as `MyDataSource`
//!
//! Each form may carry an `odbc:` scheme prefix. The driver handle lives on
//! a worker thread per connection; the async API streams rows back from it.

#![forbid(unsafe_code)]
#![warn(future_incompatible, rust_2018_idioms)]

pub mod arguments;
pub mod column;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod options;
pub mod query_result;
pub mod row;
pub mod statement;
pub mod type_info;
pub mod value;

pub use arguments::{OdbcArgumentValue, OdbcArguments};
pub use column::OdbcColumn;
pub use connection::OdbcConnection;
pub use dialect::{Dialect, SqlType};
pub use error::{Error, OdbcDatabaseError, Result};
pub use options::OdbcConnectOptions;
pub use query_result::OdbcQueryResult;
pub use row::{OdbcRow, RowIndex};
pub use statement::OdbcStatement;
pub use type_info::OdbcTypeInfo;
pub use value::OdbcValue;
