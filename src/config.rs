// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `VAULT_KEY_OUTER` | Base64 32-byte outer key-wrap layer key | Ephemeral random key if unset |
//! | `VAULT_KEY_INNER` | Base64 32-byte inner key-wrap layer key | Ephemeral random key if unset |
//! | `RUGID_SALT` | Deployment salt mixed into RugID derivation | `rugguard-dev-salt` |
//! | `SWEEP_INTERVAL_SECS` | Dead-man's-switch sweep cadence | `60` |
//! | `PACKAGE_SEND_TIMEOUT_SECS` | Disclosure + external-send timeout | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

/// Environment variable name for the data directory path.
///
/// All identity records, investigations, reports, and the audit chain are
/// stored here. In production this directory must live on encrypted,
/// access-controlled storage.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the outer vault key-wrap layer key
/// (base64, 32 bytes). Never logged, never persisted outside the secret
/// store it was loaded from.
pub const VAULT_KEY_OUTER_ENV: &str = "VAULT_KEY_OUTER";

/// Environment variable name for the inner vault key-wrap layer key
/// (base64, 32 bytes).
pub const VAULT_KEY_INNER_ENV: &str = "VAULT_KEY_INNER";

/// Environment variable name for the RugID derivation salt. Rotating it
/// changes every future derivation, so rotate only to resolve exhaustion.
pub const RUGID_SALT_ENV: &str = "RUGID_SALT";

/// Environment variable name for the dead-man's-switch sweep interval.
pub const SWEEP_INTERVAL_ENV: &str = "SWEEP_INTERVAL_SECS";

/// Environment variable name for the package disclosure/send timeout.
pub const PACKAGE_SEND_TIMEOUT_ENV: &str = "PACKAGE_SEND_TIMEOUT_SECS";
