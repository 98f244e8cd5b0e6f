use std::sync::Arc;

use engine::{InviteNotifier, LogNotifier, WebhookNotifier};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "famledger={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] settings found, nothing to run");
        return Ok(());
    };

    let notifier: Arc<dyn InviteNotifier> = match settings.notifier.webhook_url {
        Some(url) => {
            tracing::info!("sending invite notices to {url}");
            let mut webhook = WebhookNotifier::new(url);
            if let Some(app_url) = settings.notifier.app_url {
                webhook = webhook.with_app_url(app_url);
            }
            Arc::new(webhook)
        }
        None => Arc::new(LogNotifier),
    };

    tasks.spawn(async move {
        tracing::info!("Found server settings...");
        let db = match parse_database(&server.database).await {
            Ok(db) => db,
            Err(err) => {
                tracing::error!("failed to initialize database: {err}");
                return;
            }
        };

        let engine = match engine::Engine::builder()
            .database(db)
            .notifier(notifier)
            .build()
            .await
        {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!("failed to build engine from database: {err}");
                return;
            }
        };
        if let Err(err) = engine.seed_system_categories().await {
            tracing::error!("failed to seed system categories: {err}");
            return;
        }
        if let Err(err) = engine.seed_merchant_categories().await {
            tracing::error!("failed to seed merchant categories: {err}");
            return;
        }

        let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
        server::run(engine, &format!("{}:{}", bind, server.port)).await;
    });

    tasks.spawn(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("shutting down"),
            Err(err) => tracing::error!("failed to listen for shutdown signal: {err}"),
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
