//! The background worker that owns the driver connection.
//!
//! ODBC driver handles are not `Send`-safe to share, so every connection
//! spawns one dedicated OS thread that owns the `odbc_api::Connection` and
//! all prepared statements derived from it. The async side talks to it over
//! a bounded command channel; rows stream back over a bounded channel per
//! statement execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use either::Either;
use flume::TrySendError;
use futures_channel::oneshot;
use odbc_api::handles::{AsStatementRef, Statement, StatementImpl};
use odbc_api::parameter::InputParameter;
use odbc_api::{ColumnDescription, Cursor, CursorRow, IntoParameter, Prepared, ResultSetMetadata};

use crate::arguments::{OdbcArgumentValue, OdbcArguments};
use crate::column::OdbcColumn;
use crate::error::Error;
use crate::options::OdbcConnectOptions;
use crate::query_result::OdbcQueryResult;
use crate::row::OdbcRow;
use crate::type_info::OdbcTypeInfo;
use crate::value::OdbcValue;

type OdbcApiConnection = odbc_api::Connection<'static>;
type PreparedStatement<'c> = Prepared<StatementImpl<'c>>;

type AckResult = Result<(), Error>;
type AckSender = oneshot::Sender<AckResult>;

pub(crate) type ExecuteResult = Result<Either<OdbcQueryResult, OdbcRow>, Error>;
type ExecuteSender = flume::Sender<ExecuteResult>;

/// Result shape and parameter count captured at prepare time.
pub(crate) struct PreparedInfo {
    pub(crate) id: u64,
    pub(crate) columns: Vec<OdbcColumn>,
    pub(crate) parameters: usize,
}

#[derive(Debug)]
pub(crate) struct ConnectionWorker {
    command_tx: flume::Sender<Command>,
    join_handle: Option<thread::JoinHandle<()>>,
}

enum Command {
    Execute {
        sql: Box<str>,
        args: Option<OdbcArguments>,
        tx: ExecuteSender,
    },
    Prepare {
        sql: Box<str>,
        tx: oneshot::Sender<Result<PreparedInfo, Error>>,
    },
    ExecutePrepared {
        id: u64,
        args: Option<OdbcArguments>,
        tx: ExecuteSender,
    },
    CloseStatement {
        id: u64,
        tx: AckSender,
    },
    Begin {
        tx: AckSender,
    },
    Commit {
        tx: AckSender,
    },
    Rollback {
        tx: AckSender,
    },
    Ping {
        tx: AckSender,
    },
    DbmsName {
        tx: oneshot::Sender<Result<String, Error>>,
    },
    Shutdown {
        tx: oneshot::Sender<()>,
    },
}

impl ConnectionWorker {
    pub(crate) async fn establish(options: &OdbcConnectOptions) -> Result<Self, Error> {
        let (command_tx, command_rx) = flume::bounded(64);
        let (conn_tx, conn_rx) = oneshot::channel();
        let options = options.clone();

        let join_handle = thread::Builder::new()
            .name("odbckit-conn".into())
            .spawn(move || worker_thread_main(options, command_rx, conn_tx))?;

        conn_rx.await.map_err(|_| Error::WorkerCrashed)??;

        Ok(Self {
            command_tx,
            join_handle: Some(join_handle),
        })
    }

    pub(crate) async fn execute(
        &mut self,
        sql: &str,
        args: Option<OdbcArguments>,
    ) -> Result<flume::Receiver<ExecuteResult>, Error> {
        let (tx, rx) = flume::bounded(64);
        self.command_tx
            .send_async(Command::Execute {
                sql: sql.into(),
                args,
                tx,
            })
            .await
            .map_err(|_| Error::WorkerCrashed)?;
        Ok(rx)
    }

    pub(crate) async fn prepare(&mut self, sql: &str) -> Result<PreparedInfo, Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(
            &self.command_tx,
            Command::Prepare {
                sql: sql.into(),
                tx,
            },
            rx,
        )
        .await?
    }

    pub(crate) async fn execute_prepared(
        &mut self,
        id: u64,
        args: Option<OdbcArguments>,
    ) -> Result<flume::Receiver<ExecuteResult>, Error> {
        let (tx, rx) = flume::bounded(64);
        self.command_tx
            .send_async(Command::ExecutePrepared { id, args, tx })
            .await
            .map_err(|_| Error::WorkerCrashed)?;
        Ok(rx)
    }

    pub(crate) async fn close_statement(&mut self, id: u64) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::CloseStatement { id, tx }, rx).await?
    }

    pub(crate) async fn begin(&mut self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::Begin { tx }, rx).await?
    }

    pub(crate) async fn commit(&mut self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::Commit { tx }, rx).await?
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::Rollback { tx }, rx).await?
    }

    pub(crate) async fn ping(&mut self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::Ping { tx }, rx).await?
    }

    pub(crate) async fn dbms_name(&mut self) -> Result<String, Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::DbmsName { tx }, rx).await?
    }

    pub(crate) async fn shutdown(&mut self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        send_command_and_await(&self.command_tx, Command::Shutdown { tx }, rx).await
    }

    /// Best-effort synchronous shutdown, used from `Drop`.
    fn shutdown_sync(&mut self) {
        let (mut tx, _rx) = oneshot::channel();
        while let Err(TrySendError::Full(Command::Shutdown { tx: returned })) =
            self.command_tx.try_send(Command::Shutdown { tx })
        {
            tx = returned;
            log::warn!("connection worker queue is full while requesting shutdown");
            thread::sleep(Duration::from_millis(10));
        }
        if let Some(handle) = self.join_handle.take() {
            if let Err(panic) = handle.join() {
                let message = panic
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
                    .or_else(|| panic.downcast_ref::<&str>().copied())
                    .unwrap_or("unknown panic");
                log::error!("connection worker did not exit cleanly: {}", message);
            }
        }
    }
}

impl Drop for ConnectionWorker {
    fn drop(&mut self) {
        self.shutdown_sync();
    }
}

async fn send_command_and_await<T>(
    command_tx: &flume::Sender<Command>,
    command: Command,
    rx: oneshot::Receiver<T>,
) -> Result<T, Error> {
    command_tx
        .send_async(command)
        .await
        .map_err(|_| Error::WorkerCrashed)?;
    rx.await.map_err(|_| Error::WorkerCrashed)
}

/// State owned by the worker thread.
///
/// `statements` borrows the connection owned by `worker_thread_main`, which
/// keeps the state (and every prepared statement handle in it) dropped
/// before the connection they belong to.
struct WorkerState<'c> {
    statements: HashMap<u64, PreparedStatement<'c>>,
    next_statement_id: u64,
    conn: &'c OdbcApiConnection,
}

fn worker_thread_main(
    options: OdbcConnectOptions,
    command_rx: flume::Receiver<Command>,
    conn_tx: oneshot::Sender<Result<(), Error>>,
) {
    let conn = match establish_connection(&options) {
        Ok(conn) => {
            let _ = conn_tx.send(Ok(()));
            conn
        }
        Err(e) => {
            let _ = conn_tx.send(Err(e));
            return;
        }
    };

    let mut state = WorkerState {
        statements: HashMap::new(),
        next_statement_id: 1,
        conn: &conn,
    };

    while let Ok(command) = command_rx.recv() {
        if let Some(shutdown_tx) = process_command(command, &mut state) {
            drop(state);
            drop(conn);
            let _ = shutdown_tx.send(());
            return;
        }
    }
}

fn establish_connection(options: &OdbcConnectOptions) -> Result<OdbcApiConnection, Error> {
    let env = odbc_api::environment()
        .map_err(|e| Error::Configuration(e.to_string().into()))?;
    env.connect_with_connection_string(options.connection_string(), Default::default())
        .map_err(Error::from)
}

/// Handles one command, returning the acknowledgement sender when the
/// command was a shutdown request.
fn process_command(command: Command, state: &mut WorkerState<'_>) -> Option<oneshot::Sender<()>> {
    match command {
        Command::Execute { sql, args, tx } => handle_execute(state, &sql, args, &tx),
        Command::Prepare { sql, tx } => handle_prepare(state, &sql, tx),
        Command::ExecutePrepared { id, args, tx } => handle_execute_prepared(state, id, args, &tx),
        Command::CloseStatement { id, tx } => handle_close_statement(state, id, tx),
        Command::Begin { tx } => handle_begin(state, tx),
        Command::Commit { tx } => handle_commit(state, tx),
        Command::Rollback { tx } => handle_rollback(state, tx),
        Command::Ping { tx } => handle_ping(state, tx),
        Command::DbmsName { tx } => handle_dbms_name(state, tx),
        Command::Shutdown { tx } => return Some(tx),
    }
    None
}

fn handle_execute(
    state: &mut WorkerState<'_>,
    sql: &str,
    args: Option<OdbcArguments>,
    tx: &ExecuteSender,
) {
    log::debug!("executing: {}", sql);
    let params = prepare_parameters(args);

    let mut preallocated = match state.conn.preallocate() {
        Ok(preallocated) => preallocated,
        Err(e) => {
            send_error(tx, Error::from(e));
            return;
        }
    };

    let receiver_open = match preallocated.execute(sql, &params[..]) {
        Ok(Some(mut cursor)) => match stream_cursor(&mut cursor, tx) {
            Ok(open) => open,
            Err(e) => {
                send_error(tx, e);
                return;
            }
        },
        Ok(None) => true,
        Err(e) => {
            send_error(tx, Error::from(e));
            return;
        }
    };

    if receiver_open {
        let rows_affected = extract_rows_affected(&mut preallocated);
        send_done(tx, rows_affected);
    }
}

fn handle_prepare(
    state: &mut WorkerState<'_>,
    sql: &str,
    tx: oneshot::Sender<Result<PreparedInfo, Error>>,
) {
    log::debug!("preparing: {}", sql);
    let result = match state.conn.prepare(sql) {
        Ok(mut prepared) => {
            let columns = collect_columns(&mut prepared);
            let parameters = prepared.num_params().unwrap_or(0) as usize;
            let id = state.next_statement_id;
            state.next_statement_id += 1;
            state.statements.insert(id, prepared);
            Ok(PreparedInfo {
                id,
                columns,
                parameters,
            })
        }
        Err(e) => Err(Error::from(e)),
    };
    let _ = tx.send(result);
}

fn handle_execute_prepared(
    state: &mut WorkerState<'_>,
    id: u64,
    args: Option<OdbcArguments>,
    tx: &ExecuteSender,
) {
    let params = prepare_parameters(args);

    let prepared = match state.statements.get_mut(&id) {
        Some(prepared) => prepared,
        None => {
            send_error(tx, Error::StatementClosed(id));
            return;
        }
    };

    let receiver_open = match prepared.execute(&params[..]) {
        Ok(Some(mut cursor)) => match stream_cursor(&mut cursor, tx) {
            Ok(open) => open,
            Err(e) => {
                send_error(tx, e);
                return;
            }
        },
        Ok(None) => true,
        Err(e) => {
            send_error(tx, Error::from(e));
            return;
        }
    };

    if receiver_open {
        let rows_affected = extract_rows_affected(prepared);
        send_done(tx, rows_affected);
    }
}

fn handle_close_statement(state: &mut WorkerState<'_>, id: u64, tx: AckSender) {
    let result = match state.statements.remove(&id) {
        Some(_prepared) => Ok(()),
        None => Err(Error::StatementClosed(id)),
    };
    let _ = tx.send(result);
}

fn handle_begin(state: &mut WorkerState<'_>, tx: AckSender) {
    let result = transaction_op(&state.conn, "begin", |c| c.set_autocommit(false));
    let _ = tx.send(result);
}

fn handle_commit(state: &mut WorkerState<'_>, tx: AckSender) {
    let result = transaction_op(&state.conn, "commit", |c| {
        c.commit().and_then(|_| c.set_autocommit(true))
    });
    let _ = tx.send(result);
}

fn handle_rollback(state: &mut WorkerState<'_>, tx: AckSender) {
    let result = transaction_op(&state.conn, "rollback", |c| {
        c.rollback().and_then(|_| c.set_autocommit(true))
    });
    let _ = tx.send(result);
}

fn transaction_op<F>(conn: &OdbcApiConnection, name: &str, operation: F) -> AckResult
where
    F: FnOnce(&OdbcApiConnection) -> Result<(), odbc_api::Error>,
{
    operation(conn).map_err(|e| Error::Protocol(format!("failed to {} transaction: {}", name, e)))
}

fn handle_ping(state: &mut WorkerState<'_>, tx: AckSender) {
    let result = state
        .conn
        .execute("SELECT 1", (), None)
        .map(|_| ())
        .map_err(Error::from);
    let _ = tx.send(result);
}

fn handle_dbms_name(state: &mut WorkerState<'_>, tx: oneshot::Sender<Result<String, Error>>) {
    let result = state
        .conn
        .database_management_system_name()
        .map_err(Error::from);
    let _ = tx.send(result);
}

fn prepare_parameters(args: Option<OdbcArguments>) -> Vec<Box<dyn InputParameter>> {
    args.map(|args| args.values.into_iter().map(to_param).collect())
        .unwrap_or_default()
}

fn to_param(value: OdbcArgumentValue) -> Box<dyn InputParameter> {
    match value {
        OdbcArgumentValue::Int(i) => Box::new(i.into_parameter()),
        OdbcArgumentValue::Double(d) => Box::new(d.into_parameter()),
        OdbcArgumentValue::Text(s) => Box::new(s.into_parameter()),
        OdbcArgumentValue::Bytes(b) => Box::new(b.into_parameter()),
        OdbcArgumentValue::Null => Box::new(Option::<String>::None.into_parameter()),
    }
}

/// Streams every row of the cursor to the receiver. Returns whether the
/// receiver was still connected when the cursor was exhausted.
fn stream_cursor<C>(cursor: &mut C, tx: &ExecuteSender) -> Result<bool, Error>
where
    C: Cursor + ResultSetMetadata,
{
    let columns: Arc<[OdbcColumn]> = Arc::from(collect_columns(cursor));

    while let Some(mut row) = cursor.next_row()? {
        let values = collect_row_values(&mut row, &columns)?;
        let row = OdbcRow {
            columns: Arc::clone(&columns),
            values,
        };
        if tx.send(Ok(Either::Right(row))).is_err() {
            // Receiver hung up, stop fetching
            return Ok(false);
        }
    }

    Ok(true)
}

fn collect_columns<C: ResultSetMetadata>(cursor: &mut C) -> Vec<OdbcColumn> {
    let count = cursor.num_result_cols().unwrap_or(0);
    (1..=count).map(|i| create_column(cursor, i as u16)).collect()
}

fn create_column<C: ResultSetMetadata>(cursor: &mut C, index: u16) -> OdbcColumn {
    let mut description = ColumnDescription::default();
    let _ = cursor.describe_col(index, &mut description);
    OdbcColumn {
        name: decode_column_name(description.name, index),
        type_info: OdbcTypeInfo::new(description.data_type),
        ordinal: (index - 1) as usize,
    }
}

fn decode_column_name(name: Vec<u8>, index: u16) -> String {
    String::from_utf8(name).unwrap_or_else(|_| format!("col{}", index - 1))
}

fn collect_row_values(
    row: &mut CursorRow<'_>,
    columns: &[OdbcColumn],
) -> Result<Vec<OdbcValue>, Error> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| collect_cell(row, (i + 1) as u16, column))
        .collect()
}

fn collect_cell(
    row: &mut CursorRow<'_>,
    col_index: u16,
    column: &OdbcColumn,
) -> Result<OdbcValue, Error> {
    match try_get_text(row, col_index) {
        Ok(data) => Ok(OdbcValue {
            type_info: column.type_info.clone(),
            data,
            binary: false,
        }),
        // Some drivers refuse the text path for binary and wide types
        Err(_) => {
            let data = try_get_binary(row, col_index)?;
            Ok(OdbcValue {
                type_info: column.type_info.clone(),
                data,
                binary: true,
            })
        }
    }
}

fn try_get_text(row: &mut CursorRow<'_>, col_index: u16) -> Result<Option<Vec<u8>>, Error> {
    let mut buf = Vec::new();
    match row.get_text(col_index, &mut buf)? {
        true => Ok(Some(buf)),
        false => Ok(None),
    }
}

fn try_get_binary(row: &mut CursorRow<'_>, col_index: u16) -> Result<Option<Vec<u8>>, Error> {
    let mut buf = Vec::new();
    match row.get_binary(col_index, &mut buf)? {
        true => Ok(Some(buf)),
        false => Ok(None),
    }
}

fn extract_rows_affected<S: AsStatementRef>(stmt: &mut S) -> u64 {
    let mut stmt_ref = stmt.as_stmt_ref();
    let count = match stmt_ref.row_count().into_result(&stmt_ref) {
        Ok(count) => count,
        Err(e) => {
            log::warn!("failed to get row count: {}", e);
            return 0;
        }
    };
    match u64::try_from(count) {
        Ok(count) => count,
        // Drivers report -1 when no count applies
        Err(_) => 0,
    }
}

fn send_done(tx: &ExecuteSender, rows_affected: u64) {
    let _ = tx.send(Ok(Either::Left(OdbcQueryResult { rows_affected })));
}

fn send_error(tx: &ExecuteSender, error: Error) {
    let _ = tx.send(Err(error));
}
