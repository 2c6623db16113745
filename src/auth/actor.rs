// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Request-scoped actor identity.
//!
//! Session and login handling live outside this service; every request
//! carries an explicit actor identity instead of relying on ambient
//! session state. The gateway in front of this service authenticates the
//! caller and forwards the verified identity in headers:
//!
//! ```text
//! x-actor-id:   agent-7f3a
//! x-actor-role: agent
//! ```
//!
//! Use the `Auth` extractor in handlers to require an actor:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(actor): Auth) -> impl IntoResponse {
//!     // actor is Actor { actor_id, role }
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthError, Role};

/// Header carrying the verified actor id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the verified actor role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The actor performing a core operation.
///
/// Passed explicitly into every vault, generator, and engine call so
/// that each audit entry names who acted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    /// Canonical actor identifier.
    pub actor_id: String,
    /// The actor's role.
    pub role: Role,
}

impl Actor {
    /// Create an actor with the given id and role.
    pub fn new(actor_id: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
        }
    }

    /// Check if the actor has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    /// Check if this actor is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extractor requiring an actor identity on the request.
pub struct Auth(pub Actor);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .ok_or(AuthError::MissingActorIdentity)?
            .to_str()
            .map_err(|_| AuthError::InvalidActorIdentity)?
            .trim();

        if actor_id.is_empty() {
            return Err(AuthError::InvalidActorIdentity);
        }

        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .ok_or(AuthError::MissingActorIdentity)?
            .to_str()
            .map_err(|_| AuthError::InvalidActorIdentity)?;

        let role = Role::parse(role).ok_or(AuthError::UnknownRole)?;

        Ok(Auth(Actor::new(actor_id, role)))
    }
}

/// Extractor requiring an admin actor.
pub struct AdminOnly(pub Actor);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(actor) = Auth::from_request_parts(parts, state).await?;
        if !actor.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(AdminOnly(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)]) -> Result<Actor, AuthError> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        Auth::from_request_parts(&mut parts, &()).await.map(|a| a.0)
    }

    #[tokio::test]
    async fn extracts_actor_from_headers() {
        let actor = extract(&[(ACTOR_ID_HEADER, "agent-1"), (ACTOR_ROLE_HEADER, "agent")])
            .await
            .unwrap();
        assert_eq!(actor.actor_id, "agent-1");
        assert_eq!(actor.role, Role::Agent);
    }

    #[tokio::test]
    async fn missing_headers_are_rejected() {
        let err = extract(&[]).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingActorIdentity));

        let err = extract(&[(ACTOR_ID_HEADER, "agent-1")]).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingActorIdentity));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let err = extract(&[(ACTOR_ID_HEADER, "x"), (ACTOR_ROLE_HEADER, "wizard")])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownRole));
    }

    #[tokio::test]
    async fn empty_actor_id_is_rejected() {
        let err = extract(&[(ACTOR_ID_HEADER, "  "), (ACTOR_ROLE_HEADER, "admin")])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidActorIdentity));
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let request = Request::builder()
            .uri("/")
            .header(ACTOR_ID_HEADER, "agent-1")
            .header(ACTOR_ROLE_HEADER, "agent")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }
}
