use tracing::{error, info};

use baketsu::{AppState, Config, Database, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = baketsu::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        baketsu::logging::init_console_only(&config.logging.level);
    }

    info!("Baketsu - storage billing service");

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> baketsu::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let app_state = AppState::from_config(db, &config.billing)?;
    info!(
        month_basis = app_state.calculator.month_basis().as_str(),
        "Billing configured"
    );

    let server = WebServer::new(&config, app_state)?;
    info!("Server configured on {}", server.addr());

    server.run().await?;
    Ok(())
}
