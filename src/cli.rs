use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::app::{router, AppState};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, DynProductRepository, PgProductRepository};
use crate::database::query_builder::QueryLog;
use crate::services::ProductServices;

#[derive(Debug, Parser)]
#[command(name = "shop-catalog-api")]
#[command(about = "Shop product catalog API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,

        #[arg(long, help = "Apply pending migrations before serving")]
        migrate: bool,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Physically delete soft-deleted products")]
    Purge,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve { port: None, migrate: false });

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    match command {
        Commands::Serve { port, migrate } => {
            if migrate {
                DatabaseManager::migrate(&pool).await?;
            }
            serve(config, pool, port).await
        }
        Commands::Migrate => {
            DatabaseManager::migrate(&pool).await?;
            Ok(())
        }
        Commands::Purge => {
            let services = product_services(&config, pool);
            let purged = services.mutations.purge_deleted().await?;
            tracing::info!("Purged {} soft-deleted products", purged);
            println!("purged {} products", purged);
            Ok(())
        }
    }
}

fn product_services(config: &AppConfig, pool: PgPool) -> ProductServices {
    let repo: DynProductRepository = Arc::new(PgProductRepository::new(pool, QueryLog::new(&config.database)));
    ProductServices::new(repo, config.pagination.clone())
}

async fn serve(mut config: AppConfig, pool: PgPool, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.server.host, config.server.port))?;

    let services = product_services(&config, pool.clone());
    let state = AppState::new(services, Some(pool), Arc::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Shop catalog API listening on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
