// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # Investigations
//!
//! Report intake, the case state machine, and evidence package release.
//!
//! - [`model`] — case file and report types
//! - [`engine`] — transitions, guards, and the package send
//! - [`transport`] — delivery to the external authority

pub mod engine;
pub mod model;
pub mod transport;

pub use engine::{InvestigationEngine, TransitionParams, DEFAULT_SEND_TIMEOUT};
pub use model::{Investigation, InvestigationStatus, Report};
pub use transport::{DeliveredPackage, PackageTransport};
