use clap::Parser;
use console::style;
use std::process;

use odbckit_cli::Opt;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let opt = Opt::parse();

    if let Err(error) = odbckit_cli::run(opt).await {
        println!("{} {}", style("error:").bold().red(), error);
        process::exit(1);
    }
}
