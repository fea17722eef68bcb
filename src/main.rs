use comet::{
    bot::{self, BotData},
    config::{self, Environment},
    errors::Result,
    services::Services,
    web::{self, Control},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Tunables and secrets
    let app_config = Arc::new(
        config::settings::load_default_config()
            .inspect_err(|e| error!("Failed to load configuration: {}", e))?,
    );
    let env = Environment::from_env().inspect_err(|e| error!("Invalid environment: {}", e))?;
    if env.ai_api_key.is_none() {
        warn!("AI_API_KEY is not set, AI chat commands will apologise");
    }

    // 4. Initialize database
    let database = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&database)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Outbound clients
    let services = Services::new(&app_config, &env)?;
    let data = BotData::new(database, Arc::clone(&app_config), services);

    // 6. Optional status endpoint
    let control = Arc::new(Control::default());
    if let Some((port, key)) = env.web_endpoint() {
        tokio::spawn(web::run_web_server(port, key.to_string(), Arc::clone(&control)));
    } else {
        info!("WEB_PORT or OWNER_API_KEY not set, status endpoint disabled");
    }

    // 7. Run the bot, starting a fresh client after each remote restart
    loop {
        bot::run_bot(&env.discord_token, data.clone(), Arc::clone(&control)).await?;
        if !control.take_restart() {
            info!("Bot stopped");
            return Ok(());
        }
        info!("Restarting bot client...");
    }
}
