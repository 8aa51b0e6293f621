use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info, warn};

use verigate::{Config, Database, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let config = if Path::new(CONFIG_PATH).exists() {
        match Config::load_with_env(CONFIG_PATH) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {CONFIG_PATH}: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        eprintln!("{CONFIG_PATH} not found. Using default configuration.");
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Err(e) = verigate::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        verigate::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> verigate::Result<()> {
    config.validate()?;
    if config.session.secret().is_none() {
        warn!("session.jwt_secret is not set; sessions cannot be issued or verified");
    }

    let db = Database::connect(&config.database).await?;
    info!("Database ready (schema version {})", db.schema_version().await?);

    let mailer = verigate::mail::from_config(&config.mail, config.verification.token_ttl_hours)?;
    let server = WebServer::new(&config, db, mailer)?;

    info!("verigate starting on {}", server.addr());
    server.run().await
}
