use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blotato_bridge::api::accounts::{fetch_accounts, AccountLookup, AccountQuery};
use blotato_bridge::api::create_api_client;
use blotato_bridge::config::{Command, Config};
use blotato_bridge::media::MediaResolver;
use blotato_bridge::models::social_accounts_output;
use blotato_bridge::orchestrator::{PostOrchestrator, UploadOrchestrator};
use blotato_bridge::params::{parse_batch, InputItem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализируем логирование
    init_tracing()?;

    // Парсим конфигурацию из CLI и env
    let config = Config::parse();

    // Валидируем конфигурацию
    config.validate()?;

    info!(
        "Starting blotato-bridge - base URL: {}, upload mode: {:?}",
        config.base_url, config.upload_mode
    );

    let output = run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(config: &Config) -> anyhow::Result<Value> {
    match &config.command {
        // Листинг аккаунтов по умолчанию не требует сети
        Command::SocialAccounts { keep_empty, format } => {
            Ok(social_accounts_output(&config.accounts, !keep_empty, *format))
        }
        Command::Post { input } => {
            let items = read_batch(input.as_deref()).await?;
            let client = create_api_client(config)?;
            let media = MediaResolver::new(client.as_ref(), config.upload_mode)
                .with_optimize(config.optimize);
            let outcomes = PostOrchestrator::new(client.as_ref(), media, &config.accounts)
                .continue_on_fail(config.continue_on_fail)
                .publish_batch(&items)
                .await?;
            Ok(serde_json::to_value(outcomes)?)
        }
        Command::Upload { input } => {
            let items = read_batch(input.as_deref()).await?;
            let client = create_api_client(config)?;
            let media = MediaResolver::new(client.as_ref(), config.upload_mode)
                .with_optimize(config.optimize);
            let outputs = UploadOrchestrator::new(media, &config.accounts)
                .continue_on_fail(config.continue_on_fail)
                .upload_batch(&items)
                .await?;
            Ok(Value::Array(outputs))
        }
        Command::Accounts {
            platform,
            id,
            include_analytics,
            include_recent_posts,
        } => {
            let lookup = match (platform, id) {
                (Some(platform), _) => AccountLookup::ByPlatform(*platform),
                (None, Some(id)) => AccountLookup::ById(id.clone()),
                (None, None) => AccountLookup::All,
            };
            let query = AccountQuery {
                include_analytics: *include_analytics,
                include_recent_posts: *include_recent_posts,
            };
            let client = create_api_client(config)?;
            Ok(fetch_accounts(client.as_ref(), &lookup, query).await?)
        }
    }
}

/// Читает батч из файла или stdin
async fn read_batch(path: Option<&std::path::Path>) -> anyhow::Result<Vec<InputItem>> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read batch file {}", path.display()))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read batch from stdin")?;
            raw
        }
    };

    let items = parse_batch(&raw).context("failed to parse batch JSON")?;
    if items.is_empty() {
        warn!("Batch is empty");
    }
    Ok(items)
}

/// Инициализирует систему логирования с использованием tracing.
/// Пишем в stderr: stdout занят JSON-результатом.
fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    info!("Tracing initialized");
    Ok(())
}
