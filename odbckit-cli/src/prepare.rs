//! Drops and recreates the scratch database that integration suites write
//! into, echoing every statement it runs.

use anyhow::{bail, Context, Result};
use odbckit_core::{OdbcConnectOptions, OdbcConnection};

use crate::opt::PrepareOpt;

/// Name of the scratch database the toolkit owns. Anything inside it is
/// disposable.
pub const TEST_DATABASE: &str = "odbckit_test_db";

pub async fn run(opt: PrepareOpt) -> Result<()> {
    let options: OdbcConnectOptions = opt.conn_str.parse()?;

    println!("DBMS: {}", opt.dbms);
    println!("Connection string: {}", options.display_redacted());

    if !opt.dbms.supports_create_database() {
        bail!(
            "cannot prepare a scratch database on {}: no CREATE DATABASE support",
            opt.dbms
        );
    }

    if !opt.yes {
        let confirmed = promptly::prompt_default(
            format!("Drop and recreate database `{}`?", TEST_DATABASE),
            false,
        )?;
        if !confirmed {
            bail!("aborted");
        }
    }

    let mut conn = OdbcConnection::connect_with(&options)
        .await
        .context("failed to connect")?;

    let version_sql = opt.dbms.version_sql();
    println!("{}", version_sql);
    let version = conn.fetch_one(version_sql).await?;
    println!("{}", version);

    for sql in [
        format!("DROP DATABASE IF EXISTS {}", TEST_DATABASE),
        format!("CREATE DATABASE {}", TEST_DATABASE),
    ] {
        println!("{}", sql);
        conn.execute(&sql).await?;
    }

    conn.close().await?;
    Ok(())
}
