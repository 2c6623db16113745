// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # Actor Identity Module
//!
//! Session and login handling are external collaborators; the core only
//! sees an explicit, request-scoped actor identity. The gateway in front
//! of this service authenticates callers and forwards the verified
//! identity as `x-actor-id` / `x-actor-role` headers, which the `Auth`
//! extractor turns into an [`Actor`].
//!
//! Every core operation takes the acting [`Actor`] as an argument, so the
//! audit ledger can name who acted without any ambient session state.

pub mod actor;
pub mod error;
pub mod roles;

pub use actor::{Actor, AdminOnly, Auth, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
pub use error::AuthError;
pub use roles::Role;
