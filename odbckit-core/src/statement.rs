use std::sync::Arc;

use crate::column::OdbcColumn;

/// A statement prepared on a connection's worker thread.
///
/// The driver-side handle stays open until the statement is passed back to
/// [`close_statement`](crate::connection::OdbcConnection::close_statement)
/// or the connection is dropped.
#[derive(Debug)]
pub struct OdbcStatement {
    pub(crate) id: u64,
    pub(crate) sql: String,
    pub(crate) columns: Arc<[OdbcColumn]>,
    pub(crate) parameters: usize,
}

impl OdbcStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Result columns described at prepare time. Empty for statements that
    /// return no rows.
    pub fn columns(&self) -> &[OdbcColumn] {
        &self.columns
    }

    /// Number of parameter markers in the statement.
    pub fn parameters(&self) -> usize {
        self.parameters
    }
}
