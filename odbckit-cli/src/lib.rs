use anyhow::Result;

pub mod bench;
mod fmt;
mod logictest;
mod opt;
mod prepare;
mod version;

pub use opt::{
    BenchOpt, Command, FmtOpt, LogictestOpt, Opt, PrepareOpt, Strategy, VersionOpt,
};

pub async fn run(opt: Opt) -> Result<()> {
    match opt.command {
        Command::Prepare(prepare_opt) => prepare::run(prepare_opt).await,
        Command::Version(version_opt) => version::run(version_opt).await,
        Command::Logictest(logictest_opt) => logictest::run(logictest_opt).await,
        Command::Bench(bench_opt) => bench::run(bench_opt).await,
        Command::Fmt(fmt_opt) => fmt::run(fmt_opt),
    }
}
