use std::path::PathBuf;

use clap::{ArgEnum, Parser};

use odbckit_core::Dialect;

#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Opt {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub enum Command {
    /// Drop and recreate the scratch database used by integration suites
    Prepare(PrepareOpt),

    /// Probe the server version through the configured driver
    Version(VersionOpt),

    /// Run sqllogictest-style suites against the data source
    Logictest(LogictestOpt),

    /// Load a TPC-H style LINEITEM table and time insertion strategies
    Bench(BenchOpt),

    /// Run a source formatter over the workspace
    Fmt(FmtOpt),
}

#[derive(Parser, Debug)]
pub struct PrepareOpt {
    /// DBMS the connection string points at
    #[clap(long)]
    pub dbms: Dialect,

    /// ODBC connection string for a login with database DDL rights
    #[clap(long)]
    pub conn_str: String,

    /// Drop and recreate without asking for confirmation
    #[clap(short = 'y', long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct VersionOpt {
    /// DBMS the connection string points at
    #[clap(long)]
    pub dbms: Dialect,

    /// ODBC connection string
    #[clap(long)]
    pub conn_str: String,
}

#[derive(Parser, Debug)]
pub struct LogictestOpt {
    /// Run the suite of one DBMS under the suite directory
    #[clap(long)]
    pub dbms: Option<Dialect>,

    /// Run a single .test file instead of a discovered suite
    #[clap(long)]
    pub test_file: Option<PathBuf>,

    /// Echo every statement before it runs
    #[clap(long)]
    pub debug: bool,

    /// Directory holding the .test suites
    #[clap(long, default_value = "test/sql")]
    pub suite_dir: PathBuf,

    /// ODBC connection string
    #[clap(long, env = "ODBC_CONN_STRING", default_value = "Driver={DuckDB Driver};")]
    pub conn_str: String,
}

#[derive(Parser, Debug)]
pub struct BenchOpt {
    /// ODBC connection string
    #[clap(long, env = "ODBC_CONN_STRING")]
    pub conn_str: String,

    /// Override DBMS detection from the driver
    #[clap(long)]
    pub dbms: Option<Dialect>,

    /// Insertion strategy to time
    #[clap(long, arg_enum, default_value = "prepared")]
    pub strategy: Strategy,

    /// Fraction of the full six-million-row TPC-H lineitem load
    #[clap(long, default_value = "0.001")]
    pub scale_factor: f64,

    /// Rows per statement for the batched strategies
    #[clap(long, default_value = "16")]
    pub batch_size: usize,
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One direct INSERT per row
    OneByOne,

    /// One direct multi-row INSERT per batch
    Batched,

    /// A prepared single-row INSERT reused for every row
    Prepared,

    /// A prepared multi-row INSERT reused for every batch
    PreparedBatched,

    /// Every strategy in sequence, each on a fresh table
    All,
}

#[derive(Parser, Debug)]
pub struct FmtOpt {
    /// Report files that need formatting instead of rewriting them
    #[clap(long)]
    pub check: bool,

    /// Formatter executable invoked once per file
    #[clap(long, default_value = "rustfmt")]
    pub formatter: String,

    /// Glob patterns selecting files; defaults to the workspace sources
    #[clap(value_name = "PATTERN")]
    pub patterns: Vec<String>,
}
