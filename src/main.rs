use std::process::ExitCode;

use offers_api::config::AppConfig;

#[rocket::main]
async fn main() -> ExitCode {
    offers_api::init_logger();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("invalid configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    log::info!("starting offers API on port {}", config.port);

    let rocket = match offers_api::rocket(config) {
        Ok(rocket) => rocket,
        Err(err) => {
            log::error!("failed to build CORS options: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = rocket.launch().await {
        log::error!("server stopped: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
