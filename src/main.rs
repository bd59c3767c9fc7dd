//! Customer support chat server
//!
//! (c) Softlandia 2025

use support_chat_api::api;
use support_chat_api::api::rate_limit::RateLimiter;
use support_chat_api::config::AppConfig;
use support_chat_api::core::assistant::{CompletionProvider, OpenRouterProvider};
use support_chat_api::core::services::{MyAuthService, MyChatService};
use support_chat_api::infrastructure::database::DatabaseConnection;
use support_chat_api::infrastructure::repositories::{DbChatRepository, DbUserRepository};

use anyhow::anyhow;
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::{info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = ServiceCollection::new()
        .add(AppConfig::singleton())
        .add(DatabaseConnection::singleton())
        .add(DbChatRepository::scoped())
        .add(DbUserRepository::scoped())
        .add(OpenRouterProvider::singleton())
        .add(MyChatService::scoped())
        .add(MyAuthService::scoped())
        .build_provider()
        .map_err(|e| anyhow!("failed to build service provider: {e:?}"))?;

    let config = provider.get_required::<AppConfig>();
    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await?;

    let status = provider
        .get_required::<dyn CompletionProvider>()
        .check_connection()
        .await;
    if status.connected {
        info!("completion service {} reachable, model {}", status.service, status.model);
    } else {
        warn!(
            "completion service {} unavailable: {}",
            status.service,
            status.error.as_deref().unwrap_or("unknown error")
        );
    }

    let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);
    let purger = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            purger.purge_expired().await;
        }
    });

    let app = api::router(&config, limiter).with_provider(provider);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    info!("Shutting down...");

    Ok(())
}
