//! Waits for a database to accept connections, then prints the server
//! version reported through the driver.

use std::time::Duration;

use anyhow::{Context, Result};
use odbckit_core::{OdbcConnectOptions, OdbcConnection};

use crate::opt::VersionOpt;

/// Containerized databases can take minutes to initialize on first boot.
const STARTUP_ATTEMPTS: u32 = 16;
const STARTUP_DELAY: Duration = Duration::from_secs(10);

pub async fn run(opt: VersionOpt) -> Result<()> {
    let options: OdbcConnectOptions = opt.conn_str.parse()?;

    println!("DBMS: {}", opt.dbms);
    println!("Connection string: {}", options.display_redacted());

    let mut conn = OdbcConnection::connect_await_startup(&options, STARTUP_ATTEMPTS, STARTUP_DELAY)
        .await
        .context("database never accepted a connection")?;

    let version_sql = opt.dbms.version_sql();
    println!("{}", version_sql);
    let version = conn.fetch_one(version_sql).await?;
    println!("{}", version);

    conn.close().await?;
    Ok(())
}
