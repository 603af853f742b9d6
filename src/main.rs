// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

use std::{env, net::SocketAddr, sync::Arc};

use dailybudget_server::{
    api::router,
    auth::TokenService,
    config::{Config, LOG_FORMAT_ENV},
    mailer::Mailer,
    state::AppState,
    storage::LedgerDb,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().expect("Failed to load configuration");

    let db = LedgerDb::open(&config.database_path()).expect("Failed to open ledger database");

    let mailer = match &config.mail {
        Some(mail_config) => {
            Mailer::new(mail_config.clone()).expect("Failed to build mail relay client")
        }
        None => {
            tracing::warn!("MAIL_RELAY_URL not set, outbound mail is disabled");
            Mailer::disabled()
        }
    };

    let state = AppState::new(Arc::new(db), TokenService::new(&config.token_secret))
        .with_mailer(mailer)
        .with_public_hostname(config.public_hostname.clone())
        .with_request_timeout(config.request_timeout);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!("DailyBudget server listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if env::var(LOG_FORMAT_ENV).is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
