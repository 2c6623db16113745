// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rugguard_rust_server::{
    api::router,
    config::{
        DATA_DIR_ENV, PACKAGE_SEND_TIMEOUT_ENV, RUGID_SALT_ENV, SWEEP_INTERVAL_ENV,
    },
    investigation::PackageTransport,
    state::AppState,
    storage::{DataStore, StoragePaths},
    vault::{SwitchSweeper, VaultKeys},
};

#[tokio::main]
async fn main() {
    init_tracing();

    // Storage must be writable before anything else starts.
    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| "/data".to_string());
    let mut store = DataStore::new(StoragePaths::new(&data_dir));
    store
        .initialize()
        .expect("failed to initialize storage directories");
    store
        .health_check()
        .expect("storage health check failed at startup");

    let keys = VaultKeys::from_env().expect("invalid vault layer key material");
    let rugid_salt =
        env::var(RUGID_SALT_ENV).unwrap_or_else(|_| "rugguard-dev-salt".to_string());

    let send_timeout = env_duration(PACKAGE_SEND_TIMEOUT_ENV, 30);
    let state = AppState::build(
        store,
        keys,
        rugid_salt,
        PackageTransport::http(),
        send_timeout,
    )
    .expect("failed to open the audit ledger");
    info!(
        data_dir,
        ledger_seq = state.ledger.last_seq(),
        "storage and audit ledger ready"
    );

    // Background dead-man's-switch sweeper.
    let shutdown = CancellationToken::new();
    let sweep_interval = env_duration(SWEEP_INTERVAL_ENV, 60);
    let sweeper = SwitchSweeper::with_interval(Arc::clone(&state.vault), sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("failed to parse bind address");

    info!(%addr, "RugGuard core listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("server failed");

    shutdown.cancel();
    let _ = sweeper_handle.await;
    info!("shutdown complete");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    if format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn env_duration(var: &str, default_secs: u64) -> Duration {
    let secs = env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("ctrl-c received, shutting down");
    shutdown.cancel();
}
