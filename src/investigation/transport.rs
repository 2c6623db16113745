// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Evidence package delivery.
//!
//! Packages leave the system exactly once, over HTTPS to the authority
//! endpoint configured per send. The in-memory transport backs tests;
//! the failing transport simulates an authority outage.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{CoreError, CoreResult};

/// A package captured by the in-memory transport.
#[derive(Debug, Clone)]
pub struct DeliveredPackage {
    pub destination: String,
    pub body: serde_json::Value,
}

/// Transport used to hand an evidence package to an external authority.
#[derive(Clone)]
pub enum PackageTransport {
    /// POST the package as JSON to the destination URL.
    Http(reqwest::Client),
    /// Capture packages in memory.
    Memory(Arc<Mutex<Vec<DeliveredPackage>>>),
    /// Fail every delivery.
    Failing,
}

impl PackageTransport {
    pub fn http() -> Self {
        Self::Http(reqwest::Client::new())
    }

    pub fn memory() -> Self {
        Self::Memory(Arc::new(Mutex::new(Vec::new())))
    }

    /// Packages captured so far (in-memory transport only).
    pub fn delivered(&self) -> Vec<DeliveredPackage> {
        match self {
            Self::Memory(sent) => sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            _ => Vec::new(),
        }
    }

    /// Deliver one package. Callers wrap this in their own deadline.
    pub async fn deliver(&self, destination: &str, body: &serde_json::Value) -> CoreResult<()> {
        match self {
            Self::Http(client) => {
                let response = client
                    .post(destination)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| CoreError::PackageDelivery(e.to_string()))?;
                response
                    .error_for_status()
                    .map_err(|e| CoreError::PackageDelivery(e.to_string()))?;
                Ok(())
            }
            Self::Memory(sent) => {
                sent.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(DeliveredPackage {
                        destination: destination.to_string(),
                        body: body.clone(),
                    });
                Ok(())
            }
            Self::Failing => Err(CoreError::PackageDelivery(
                "authority endpoint unavailable".to_string(),
            )),
        }
    }
}
