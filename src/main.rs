// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exoquest_api::{
    api::{router, RouterOptions},
    auth::{PasswordHasher, TokenService},
    config::{ConfigError, LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::{RedbStore, StoreError, StorePool},
    tls::{install_crypto_provider, load_rustls_config, TlsError},
};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Secrets shorter than this are accepted with a warning.
const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open database: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ExoQuest Research API stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;
    info!(?config, "Loaded configuration");

    if config.ephemeral_secret {
        warn!("JWT_SECRET not set; using an ephemeral secret (tokens will not survive a restart)");
    } else if config.jwt_secret.len() < RECOMMENDED_SECRET_LEN {
        warn!(
            min_len = RECOMMENDED_SECRET_LEN,
            "JWT_SECRET is shorter than recommended"
        );
    }

    let store = RedbStore::open(&config.database_path)?;
    info!(path = %config.database_path.display(), "Opened researcher database");

    let pool = StorePool::new(Arc::new(store), config.pool.clone());
    let state = AppState::new(
        pool.clone(),
        TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl),
        PasswordHasher::new(config.bcrypt_cost),
    );
    let app = router(state, &RouterOptions::from(&config))
        .into_make_service_with_connect_info::<SocketAddr>();

    let handle: axum_server::Handle<SocketAddr> = axum_server::Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received, draining connections");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    let addr = config.bind_addr;
    let served = match &config.tls {
        Some(paths) => {
            install_crypto_provider();
            let tls_config = load_rustls_config(paths).await?;
            info!("ExoQuest Research API listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app)
                .await
        }
        None => {
            info!("ExoQuest Research API listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr).handle(handle).serve(app).await
        }
    };

    pool.close();
    info!("Store pool closed");
    served?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
