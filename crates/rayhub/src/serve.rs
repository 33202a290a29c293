// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rayhub serve` command implementation.
//!
//! Opens the database, wires the Telegram bridge and webhook client into the
//! CRM services, and runs the HTTP gateway until SIGINT or SIGTERM.

use std::sync::Arc;

use rayhub_config::RayhubConfig;
use rayhub_core::RayhubError;
use rayhub_core::traits::{MessagingBridge, PluginAdapter, WebhookSink};
use rayhub_core::types::HealthStatus;
use rayhub_crm::Crm;
use rayhub_gateway::{GatewayState, ServerConfig};
use rayhub_storage::Database;
use rayhub_telegram::TelegramBridge;
use rayhub_webhook::HttpWebhook;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Run the service until a shutdown signal arrives.
pub async fn run_serve(config: RayhubConfig) -> Result<(), RayhubError> {
    init_tracing(&config.service.log_level);
    info!("starting rayhub serve");

    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
    info!(path = %config.storage.database_path, "database ready");

    let bridge: Option<Arc<dyn MessagingBridge>> = match config.telegram.bot_token.as_deref() {
        Some(token) if !token.is_empty() => {
            let bridge = TelegramBridge::new(&config.telegram)?;
            match bridge.health_check().await {
                Ok(HealthStatus::Healthy) => info!("telegram bridge connected"),
                Ok(status) => warn!(?status, "telegram bridge not healthy"),
                Err(e) => warn!(error = %e, "telegram health check failed"),
            }
            Some(Arc::new(bridge) as Arc<dyn MessagingBridge>)
        }
        _ => {
            warn!("telegram.bot_token not set, running without the Telegram bridge");
            None
        }
    };
    let webhook: Arc<dyn WebhookSink> = Arc::new(HttpWebhook::new(&config.webhooks)?);

    let config = Arc::new(config);
    let crm = Crm::new(db.clone(), bridge.clone(), webhook.clone(), config.clone());

    let cancel = install_signal_handler();

    if config.gateway.enabled {
        let server_config = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        let shutdown = cancel.clone();
        rayhub_gateway::start_server(&server_config, GatewayState::new(crm), async move {
            shutdown.cancelled().await;
        })
        .await?;
    } else {
        info!("gateway disabled, waiting for shutdown signal");
        cancel.cancelled().await;
    }

    if let Some(bridge) = bridge
        && let Err(e) = bridge.shutdown().await
    {
        error!(error = %e, "telegram bridge shutdown failed");
    }
    if let Err(e) = webhook.shutdown().await {
        error!(error = %e, "webhook client shutdown failed");
    }
    db.close().await?;

    info!("rayhub serve shutdown complete");
    Ok(())
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rayhub={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
