//! Bulk-insert benchmark comparing parameter binding strategies.
//!
//! Each strategy loads the same generated data set into a freshly created
//! table inside a single transaction, then reports wall-clock throughput
//! and re-counts the table to confirm the commit.

pub mod lineitem;

use std::time::Instant;

use anyhow::{anyhow, Result};
use odbckit_core::{Dialect, OdbcArguments, OdbcConnectOptions, OdbcConnection};

use crate::opt::{BenchOpt, Strategy};
use lineitem::{Lineitem, LineitemGenerator, COLUMNS, TABLE};

const PROGRESS_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStrategy {
    /// One INSERT statement per row.
    OneByOne,
    /// Multi-row VALUES statements.
    Batched,
    /// A single prepared INSERT executed per row.
    Prepared,
    /// A prepared multi-row INSERT executed per batch.
    PreparedBatched,
}

impl InsertStrategy {
    pub const ALL: [InsertStrategy; 4] = [
        InsertStrategy::OneByOne,
        InsertStrategy::Batched,
        InsertStrategy::Prepared,
        InsertStrategy::PreparedBatched,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InsertStrategy::OneByOne => "one-by-one",
            InsertStrategy::Batched => "batched",
            InsertStrategy::Prepared => "prepared",
            InsertStrategy::PreparedBatched => "prepared-batched",
        }
    }
}

fn expand(strategy: Strategy) -> Vec<InsertStrategy> {
    match strategy {
        Strategy::OneByOne => vec![InsertStrategy::OneByOne],
        Strategy::Batched => vec![InsertStrategy::Batched],
        Strategy::Prepared => vec![InsertStrategy::Prepared],
        Strategy::PreparedBatched => vec![InsertStrategy::PreparedBatched],
        Strategy::All => InsertStrategy::ALL.to_vec(),
    }
}

pub(crate) async fn run(opt: BenchOpt) -> Result<()> {
    let options: OdbcConnectOptions = opt.conn_str.parse()?;
    println!("ODBC_CONN_STRING: {}", options.display_redacted());
    let mut conn = OdbcConnection::connect_with(&options).await?;

    let dialect = match opt.dbms {
        Some(dialect) => dialect,
        None => {
            let dbms = conn.dbms_name().await?;
            Dialect::from_dbms_name(&dbms).ok_or_else(|| {
                anyhow!("could not infer a dialect from DBMS `{}`, pass --dbms", dbms)
            })?
        }
    };
    println!("DBMS: {}", dialect);

    let version_sql = dialect.version_sql();
    println!("{}", version_sql);
    if let Some(row) = conn.fetch_optional(version_sql).await? {
        println!("{}", row);
    }

    for strategy in expand(opt.strategy) {
        println!("Strategy: {}", strategy.label());
        recreate_table(&mut conn, dialect).await?;

        let rows: Vec<Lineitem> = LineitemGenerator::new(opt.scale_factor).collect();
        println!("Records: {}", rows.len());

        let started = Instant::now();
        let inserted = load(&mut conn, dialect, strategy, &rows, opt.batch_size).await?;
        let elapsed = started.elapsed();
        println!("Elapsed: {}s", elapsed.as_secs());
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            println!("Records per second: {}", (inserted as f64 / secs).floor());
        }

        let count_sql = format!("SELECT COUNT(*) FROM {}", TABLE);
        let committed = conn
            .fetch_one(&count_sql)
            .await?
            .try_get_i64(0)?
            .unwrap_or(0);
        println!("Rows in table: {}", committed);

        // Spot check a row well past the first batch
        let probe_sql = dialect.select_one_at_offset_sql(TABLE, "L_ORDERKEY", 4096);
        if let Some(row) = conn.fetch_optional(&probe_sql).await? {
            println!("{}", row);
        }
    }

    conn.close().await?;
    Ok(())
}

/// Drops the benchmark table if it exists and creates it fresh.
pub async fn recreate_table(conn: &mut OdbcConnection, dialect: Dialect) -> Result<()> {
    let exists_sql = dialect.table_exists_sql(TABLE);
    let existing = conn.fetch_one(&exists_sql).await?.try_get_i64(0)?.unwrap_or(0);
    if existing > 0 {
        let drop_sql = dialect.drop_table_sql(TABLE);
        println!("{}", drop_sql);
        conn.execute(&drop_sql).await?;
    }
    let create_sql = dialect.create_table_sql(TABLE, COLUMNS);
    println!("{}", create_sql);
    conn.execute(&create_sql).await?;
    Ok(())
}

/// Inserts `rows` with the given strategy inside one transaction. Rolls the
/// transaction back if any insert fails.
pub async fn load(
    conn: &mut OdbcConnection,
    dialect: Dialect,
    strategy: InsertStrategy,
    rows: &[Lineitem],
    batch_size: usize,
) -> Result<u64> {
    conn.begin().await?;
    let inserted = match strategy {
        InsertStrategy::OneByOne => insert_one_by_one(conn, dialect, rows).await,
        InsertStrategy::Batched => insert_batched(conn, dialect, rows, batch_size).await,
        InsertStrategy::Prepared => insert_prepared(conn, dialect, rows).await,
        InsertStrategy::PreparedBatched => {
            insert_prepared_batched(conn, dialect, rows, batch_size).await
        }
    };
    match inserted {
        Ok(count) => {
            conn.commit().await?;
            Ok(count)
        }
        Err(e) => {
            if let Err(rollback_error) = conn.rollback().await {
                log::warn!("rollback after failed load also failed: {}", rollback_error);
            }
            Err(e)
        }
    }
}

async fn insert_one_by_one(
    conn: &mut OdbcConnection,
    dialect: Dialect,
    rows: &[Lineitem],
) -> Result<u64> {
    let sql = dialect.insert_sql(TABLE, COLUMNS);
    let mut count = 0u64;
    for row in rows {
        let mut args = OdbcArguments::new();
        row.bind(dialect, &mut args);
        conn.execute_with(&sql, args).await?;
        count += 1;
        report_progress(count - 1, count);
    }
    Ok(count)
}

async fn insert_batched(
    conn: &mut OdbcConnection,
    dialect: Dialect,
    rows: &[Lineitem],
    batch_size: usize,
) -> Result<u64> {
    let batch_size = batch_size.max(1);
    let mut count = 0u64;
    for chunk in rows.chunks(batch_size) {
        let sql = dialect.multi_insert_sql(TABLE, COLUMNS, chunk.len());
        let mut args = OdbcArguments::new();
        args.reserve(chunk.len() * COLUMNS.len());
        for row in chunk {
            row.bind(dialect, &mut args);
        }
        conn.execute_with(&sql, args).await?;
        let before = count;
        count += chunk.len() as u64;
        report_progress(before, count);
    }
    Ok(count)
}

async fn insert_prepared(
    conn: &mut OdbcConnection,
    dialect: Dialect,
    rows: &[Lineitem],
) -> Result<u64> {
    let sql = dialect.insert_sql(TABLE, COLUMNS);
    let statement = conn.prepare(&sql).await?;
    let mut count = 0u64;
    for row in rows {
        let mut args = OdbcArguments::new();
        row.bind(dialect, &mut args);
        conn.execute_prepared(&statement, args).await?;
        count += 1;
        report_progress(count - 1, count);
    }
    conn.close_statement(statement).await?;
    Ok(count)
}

async fn insert_prepared_batched(
    conn: &mut OdbcConnection,
    dialect: Dialect,
    rows: &[Lineitem],
    batch_size: usize,
) -> Result<u64> {
    let batch_size = batch_size.max(1);
    let mut statement = conn
        .prepare(&dialect.multi_insert_sql(TABLE, COLUMNS, batch_size))
        .await?;
    let mut count = 0u64;
    for chunk in rows.chunks(batch_size) {
        if chunk.len() != batch_size {
            // A trailing partial batch needs a statement of its own shape
            let trailing = conn
                .prepare(&dialect.multi_insert_sql(TABLE, COLUMNS, chunk.len()))
                .await?;
            let full = std::mem::replace(&mut statement, trailing);
            conn.close_statement(full).await?;
        }
        let mut args = OdbcArguments::new();
        args.reserve(chunk.len() * COLUMNS.len());
        for row in chunk {
            row.bind(dialect, &mut args);
        }
        conn.execute_prepared(&statement, args).await?;
        let before = count;
        count += chunk.len() as u64;
        report_progress(before, count);
    }
    conn.close_statement(statement).await?;
    Ok(count)
}

fn report_progress(before: u64, after: u64) {
    if crossed_interval(before, after) {
        println!("Inserted: {}", after);
    }
}

fn crossed_interval(before: u64, after: u64) -> bool {
    after / PROGRESS_INTERVAL > before / PROGRESS_INTERVAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_single_strategies() {
        assert_eq!(expand(Strategy::OneByOne), vec![InsertStrategy::OneByOne]);
        assert_eq!(expand(Strategy::Batched), vec![InsertStrategy::Batched]);
        assert_eq!(expand(Strategy::Prepared), vec![InsertStrategy::Prepared]);
        assert_eq!(
            expand(Strategy::PreparedBatched),
            vec![InsertStrategy::PreparedBatched]
        );
    }

    #[test]
    fn test_expand_all_runs_every_strategy() {
        assert_eq!(expand(Strategy::All), InsertStrategy::ALL.to_vec());
    }

    #[test]
    fn test_strategy_labels_are_distinct() {
        let labels: std::collections::BTreeSet<&str> =
            InsertStrategy::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), InsertStrategy::ALL.len());
    }

    #[test]
    fn test_progress_reports_once_per_interval() {
        assert!(!crossed_interval(0, 1023));
        assert!(crossed_interval(1023, 1024));
        assert!(!crossed_interval(1024, 1025));
        assert!(crossed_interval(1000, 3000));
    }
}
