// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # Dead-man's-switch sweeper
//!
//! Background task that periodically scans the vault for armed records
//! whose deadline has elapsed and transitions them to `pending_unmask`.
//! The transition is journaled with the `system.sweeper` actor, so an
//! unmask never depends on a client happening to poll.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::IdentityVault;

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background sweeper for expired dead-man's switches.
pub struct SwitchSweeper {
    vault: Arc<IdentityVault>,
    sweep_interval: Duration,
}

impl SwitchSweeper {
    pub fn new(vault: Arc<IdentityVault>) -> Self {
        Self {
            vault,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(vault: Arc<IdentityVault>, sweep_interval: Duration) -> Self {
        Self {
            vault,
            sweep_interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Switch sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Switch sweeper shutting down");
                return;
            }

            self.sweep_step();

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Switch sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep pass over the vault.
    fn sweep_step(&self) {
        match self.vault.sweep_expired_switches() {
            Ok(0) => {}
            Ok(triggered) => {
                info!(triggered, "Switch sweeper: switches triggered");
            }
            Err(e) => {
                warn!(error = %e, "Switch sweeper: sweep failed");
            }
        }
    }
}
