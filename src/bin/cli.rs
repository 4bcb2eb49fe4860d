use std::process::ExitCode;

use clap::Parser;

use offers_api::cli::{CliArgs, USAGE, run_import};
use offers_api::db::PgDatabaseClient;

#[tokio::main]
async fn main() -> ExitCode {
    offers_api::init_logger();

    let args = CliArgs::parse();
    let import = match args.import_args() {
        Ok(import) => import,
        Err(err) => {
            println!("error: {err}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run_import(import, PgDatabaseClient::new()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("import failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
