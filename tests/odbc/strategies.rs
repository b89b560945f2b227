//! Cross-checks the benchmark insertion strategies against a live data
//! source: every strategy must leave the same committed row count behind.
//!
//! Runs only when `ODBC_CONN_STRING` is set and the driver reports a DBMS
//! the dialect registry knows.

use odbckit::{Dialect, OdbcConnection};
use odbckit_cli::bench::{lineitem, load, recreate_table, InsertStrategy};

#[tokio::test]
async fn every_strategy_inserts_the_same_rows() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = env_logger::builder()
        .target(env_logger::Target::Stderr)
        .try_init();

    let Ok(conn_str) = std::env::var("ODBC_CONN_STRING") else {
        eprintln!("ODBC_CONN_STRING is not set, skipping");
        return Ok(());
    };
    let mut conn = OdbcConnection::connect(&conn_str).await?;

    let dbms = conn.dbms_name().await?;
    let Some(dialect) = Dialect::from_dbms_name(&dbms) else {
        eprintln!("no dialect known for DBMS `{}`, skipping", dbms);
        return Ok(());
    };

    let rows: Vec<_> = lineitem::LineitemGenerator::new(0.0001).collect();
    let count_sql = format!("SELECT COUNT(*) FROM {}", lineitem::TABLE);

    for strategy in InsertStrategy::ALL {
        recreate_table(&mut conn, dialect).await?;
        let inserted = load(&mut conn, dialect, strategy, &rows, 16).await?;
        assert_eq!(inserted, rows.len() as u64, "{}", strategy.label());

        let committed = conn.fetch_one(&count_sql).await?.try_get_i64(0)?;
        assert_eq!(committed, Some(rows.len() as i64), "{}", strategy.label());
    }

    conn.execute(&dialect.drop_table_sql(lineitem::TABLE)).await?;
    conn.close().await?;
    Ok(())
}
