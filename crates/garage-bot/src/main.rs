mod acquisition;
mod barcode;
mod commands;
mod dispatch;
mod present;
mod session;
mod store;
mod telegram;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use garage_core::AppConfig;
use garage_scraper::{
    is_selection_page, parse_part_page, parse_selection_page, CatalogueClient,
};

use crate::barcode::ZbarDecoder;
use crate::commands::Bot;
use crate::telegram::{TelegramClient, TelegramPresenter};

#[derive(Debug, Parser)]
#[command(name = "garage-bot")]
#[command(about = "Telegram bot that keeps track of a garage's spare parts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve Telegram users until interrupted (the default)
    Run,
    /// Apply pending database migrations and exit
    Migrate,
    /// Look a part code up in the catalogue and print what was found
    Lookup { code: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = garage_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config).await,
        Commands::Migrate => migrate(&config).await,
        Commands::Lookup { code } => lookup(&config, &code).await,
    }
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let token = config.require_bot_token()?;
    let pool = connect(config).await?;

    let catalogue = catalogue_client(config)?;
    let telegram = TelegramClient::new(&config.telegram_api_url, token, config.poll_timeout_secs)?;
    let presenter = Arc::new(TelegramPresenter::new(telegram));
    let decoder = ZbarDecoder::new(config.zbarimg_path.clone());
    let bot = Arc::new(Bot::new(
        catalogue,
        Arc::new(pool),
        Arc::clone(&presenter),
        decoder,
    ));

    telegram::run_polling(presenter, bot, config.poll_timeout_secs, shutdown_signal()).await;
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    connect(config).await?;
    Ok(())
}

async fn lookup(config: &AppConfig, code: &str) -> anyhow::Result<()> {
    let client = catalogue_client(config)?;
    let url = client.code_to_url(code)?;
    let html = client.fetch(&url).await?;

    if is_selection_page(&html) {
        let options = parse_selection_page(&html, client.base_url());
        println!("{code}: {} catalogue(s)", options.len());
        for option in options {
            println!("{}\t{}", option.label(), option.url);
        }
    } else {
        let part = parse_part_page(&html)?;
        println!(
            "{}\t{}\t{}\t{url}",
            part.part_number, part.catalogue_name, part.description
        );
    }
    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::SqlitePool> {
    let pool_config = garage_db::PoolConfig::from_app_config(config);
    let pool = garage_db::connect_pool(&config.database_url, pool_config).await?;
    garage_db::ping(&pool).await?;
    let applied = garage_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database ready");
    Ok(pool)
}

fn catalogue_client(config: &AppConfig) -> anyhow::Result<CatalogueClient> {
    Ok(CatalogueClient::new(
        &config.catalogue_base_url,
        config.catalogue_timeout_secs,
        &config.catalogue_user_agent,
    )?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping");
}
