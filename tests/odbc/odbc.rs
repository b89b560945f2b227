//! End-to-end tests against a live ODBC data source.
//!
//! These run only when `ODBC_CONN_STRING` is set (a `.env` file works); with
//! no configured driver every test passes trivially.

use odbckit::{OdbcArguments, OdbcConnection};

fn setup_if_needed() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::builder()
        .target(env_logger::Target::Stderr)
        .try_init();
}

async fn new() -> anyhow::Result<Option<OdbcConnection>> {
    setup_if_needed();
    let Ok(conn_str) = std::env::var("ODBC_CONN_STRING") else {
        eprintln!("ODBC_CONN_STRING is not set, skipping");
        return Ok(None);
    };
    Ok(Some(OdbcConnection::connect(&conn_str).await?))
}

#[tokio::test]
async fn it_connects_and_pings() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    conn.ping().await?;
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn it_executes_a_simple_select() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    let row = conn.fetch_one("SELECT 1").await?;
    assert_eq!(row.try_get_i64(0)?, Some(1));
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn it_binds_positional_parameters() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    let mut args = OdbcArguments::new();
    args.add(42i64);
    args.add("hello");
    let rows = conn.fetch_all_with("SELECT ?, ?", args).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].try_get_i64(0)?, Some(42));
    assert_eq!(rows[0].try_get_str(1)?, Some("hello"));
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn it_reports_the_dbms_name() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    let name = conn.dbms_name().await?;
    assert!(!name.is_empty());
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn it_can_work_with_transactions() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    // No portable IF EXISTS; the table may not be there yet
    let _ = conn.execute("DROP TABLE odbckit_tx_smoke").await;
    conn.execute("CREATE TABLE odbckit_tx_smoke (n INTEGER)")
        .await?;

    conn.begin().await?;
    conn.execute("INSERT INTO odbckit_tx_smoke VALUES (1)")
        .await?;
    conn.rollback().await?;
    let count = conn
        .fetch_one("SELECT COUNT(*) FROM odbckit_tx_smoke")
        .await?
        .try_get_i64(0)?;
    assert_eq!(count, Some(0));

    conn.begin().await?;
    conn.execute("INSERT INTO odbckit_tx_smoke VALUES (2)")
        .await?;
    conn.commit().await?;
    let count = conn
        .fetch_one("SELECT COUNT(*) FROM odbckit_tx_smoke")
        .await?
        .try_get_i64(0)?;
    assert_eq!(count, Some(1));

    conn.execute("DROP TABLE odbckit_tx_smoke").await?;
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn it_reuses_a_prepared_statement() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    let statement = conn.prepare("SELECT ?").await?;

    let mut args = OdbcArguments::new();
    args.add(7i64);
    let rows = conn.fetch_all_prepared(&statement, args).await?;
    assert_eq!(rows[0].try_get_i64(0)?, Some(7));

    let mut args = OdbcArguments::new();
    args.add(8i64);
    let rows = conn.fetch_all_prepared(&statement, args).await?;
    assert_eq!(rows[0].try_get_i64(0)?, Some(8));

    conn.close_statement(statement).await?;
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn it_recovers_after_a_failed_statement() -> anyhow::Result<()> {
    let Some(mut conn) = new().await? else {
        return Ok(());
    };
    assert!(conn.execute("THIS IS NOT SQL").await.is_err());
    let row = conn.fetch_one("SELECT 1").await?;
    assert_eq!(row.try_get_i64(0)?, Some(1));
    conn.close().await?;
    Ok(())
}
