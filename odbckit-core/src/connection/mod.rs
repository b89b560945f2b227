//! A single asynchronous connection to an ODBC data source.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use either::Either;

use crate::arguments::OdbcArguments;
use crate::error::Error;
use crate::options::OdbcConnectOptions;
use crate::query_result::OdbcQueryResult;
use crate::row::OdbcRow;
use crate::statement::OdbcStatement;

mod worker;

use worker::{ConnectionWorker, ExecuteResult};

/// A connection to a database through an ODBC driver.
///
/// The driver handle lives on a dedicated worker thread owned by this value;
/// dropping the connection shuts the worker down. Statements run strictly
/// one at a time per connection.
pub struct OdbcConnection {
    worker: ConnectionWorker,
}

impl Debug for OdbcConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcConnection").finish_non_exhaustive()
    }
}

impl OdbcConnection {
    /// Opens a connection from a connection string in any of the forms
    /// [`OdbcConnectOptions`] accepts.
    pub async fn connect(conn_str: &str) -> Result<Self, Error> {
        let options: OdbcConnectOptions = conn_str.parse()?;
        Self::connect_with(&options).await
    }

    pub async fn connect_with(options: &OdbcConnectOptions) -> Result<Self, Error> {
        let worker = ConnectionWorker::establish(options).await?;
        Ok(Self { worker })
    }

    /// Repeatedly tries to connect to a database that may still be starting
    /// up, sleeping `delay` between attempts.
    ///
    /// Fails with [`Error::StartupTimeout`] wrapping the last connect error
    /// once all attempts are spent.
    pub async fn connect_await_startup(
        options: &OdbcConnectOptions,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, Error> {
        let mut last_error: Option<Error> = None;
        for attempt in 1..=attempts {
            match Self::connect_with(options).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    log::warn!("connection attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }
        match last_error {
            Some(source) => Err(Error::StartupTimeout {
                attempts,
                source: Box::new(source),
            }),
            None => Err(Error::Configuration(
                "startup wait needs at least one attempt".into(),
            )),
        }
    }

    /// Executes a statement without parameters and returns the affected row
    /// count, discarding any rows it produces.
    pub async fn execute(&mut self, sql: &str) -> Result<OdbcQueryResult, Error> {
        self.execute_with(sql, OdbcArguments::new()).await
    }

    /// Executes a statement with positional parameters bound to its `?`
    /// markers.
    pub async fn execute_with(
        &mut self,
        sql: &str,
        args: OdbcArguments,
    ) -> Result<OdbcQueryResult, Error> {
        let rx = self.worker.execute(sql, some_args(args)).await?;
        collect_result(rx).await
    }

    /// Runs a query and buffers all resulting rows.
    pub async fn fetch_all(&mut self, sql: &str) -> Result<Vec<OdbcRow>, Error> {
        let rx = self.worker.execute(sql, None).await?;
        collect_rows(rx).await
    }

    pub async fn fetch_all_with(
        &mut self,
        sql: &str,
        args: OdbcArguments,
    ) -> Result<Vec<OdbcRow>, Error> {
        let rx = self.worker.execute(sql, some_args(args)).await?;
        collect_rows(rx).await
    }

    /// Runs a query and returns its first row, if any. Remaining rows are
    /// not fetched.
    pub async fn fetch_optional(&mut self, sql: &str) -> Result<Option<OdbcRow>, Error> {
        let rx = self.worker.execute(sql, None).await?;
        while let Ok(item) = rx.recv_async().await {
            if let Either::Right(row) = item? {
                // Dropping the receiver stops the worker's fetch loop
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    /// Runs a query that must return at least one row.
    pub async fn fetch_one(&mut self, sql: &str) -> Result<OdbcRow, Error> {
        self.fetch_optional(sql).await?.ok_or(Error::RowNotFound)
    }

    /// Prepares a statement on the worker thread for repeated execution.
    pub async fn prepare(&mut self, sql: &str) -> Result<OdbcStatement, Error> {
        let info = self.worker.prepare(sql).await?;
        Ok(OdbcStatement {
            id: info.id,
            sql: sql.to_string(),
            columns: Arc::from(info.columns),
            parameters: info.parameters,
        })
    }

    /// Executes a prepared statement, discarding any rows it produces.
    pub async fn execute_prepared(
        &mut self,
        statement: &OdbcStatement,
        args: OdbcArguments,
    ) -> Result<OdbcQueryResult, Error> {
        let rx = self
            .worker
            .execute_prepared(statement.id, some_args(args))
            .await?;
        collect_result(rx).await
    }

    /// Executes a prepared statement and buffers all resulting rows.
    pub async fn fetch_all_prepared(
        &mut self,
        statement: &OdbcStatement,
        args: OdbcArguments,
    ) -> Result<Vec<OdbcRow>, Error> {
        let rx = self
            .worker
            .execute_prepared(statement.id, some_args(args))
            .await?;
        collect_rows(rx).await
    }

    /// Releases the driver-side handle of a prepared statement.
    pub async fn close_statement(&mut self, statement: OdbcStatement) -> Result<(), Error> {
        self.worker.close_statement(statement.id).await
    }

    /// Turns autocommit off; statements run after this are committed or
    /// rolled back together.
    pub async fn begin(&mut self) -> Result<(), Error> {
        self.worker.begin().await
    }

    /// Commits the open transaction and restores autocommit.
    pub async fn commit(&mut self) -> Result<(), Error> {
        self.worker.commit().await
    }

    /// Rolls back the open transaction and restores autocommit.
    pub async fn rollback(&mut self) -> Result<(), Error> {
        self.worker.rollback().await
    }

    /// Checks the connection is alive by executing a trivial query.
    pub async fn ping(&mut self) -> Result<(), Error> {
        self.worker.ping().await
    }

    /// The product name the driver reports for the connected server, for
    /// example "Microsoft SQL Server" or "DuckDB".
    pub async fn dbms_name(&mut self) -> Result<String, Error> {
        self.worker.dbms_name().await
    }

    /// Closes the connection, waiting for the worker thread to release the
    /// driver handle.
    pub async fn close(mut self) -> Result<(), Error> {
        self.worker.shutdown().await
    }
}

fn some_args(args: OdbcArguments) -> Option<OdbcArguments> {
    if args.is_empty() {
        None
    } else {
        Some(args)
    }
}

async fn collect_result(rx: flume::Receiver<ExecuteResult>) -> Result<OdbcQueryResult, Error> {
    let mut result = OdbcQueryResult::default();
    while let Ok(item) = rx.recv_async().await {
        match item? {
            Either::Left(done) => result.extend([done]),
            Either::Right(_) => {}
        }
    }
    Ok(result)
}

async fn collect_rows(rx: flume::Receiver<ExecuteResult>) -> Result<Vec<OdbcRow>, Error> {
    let mut rows = Vec::new();
    while let Ok(item) = rx.recv_async().await {
        match item? {
            Either::Left(_) => {}
            Either::Right(row) => rows.push(row),
        }
    }
    Ok(rows)
}
