//! Actor Extractor
//!
//! Identity is resolved upstream (gateway / auth service) and forwarded as
//! `X-Actor-Id` and `X-Actor-Role` headers.

use axum::{extract::FromRequestParts, http::request::Parts};
use http::HeaderMap;
use shared::error::{AppError, ErrorCode};
use shared::models::{Actor, Role};

use crate::core::ServerState;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Authenticated actor, required
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

/// Actor if the request carries one
#[derive(Debug, Clone, Copy)]
pub struct MaybeActor(pub Option<Actor>);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse the actor headers; `Ok(None)` when no id header is present
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Option<Actor>, AppError> {
    let Some(raw_id) = header(headers, ACTOR_ID_HEADER) else {
        return Ok(None);
    };
    let id: i64 = raw_id.trim().parse().map_err(|_| {
        AppError::with_message(ErrorCode::InvalidActor, format!("Invalid actor id: {}", raw_id))
    })?;
    let role = match header(headers, ACTOR_ROLE_HEADER) {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| AppError::with_message(ErrorCode::InvalidActor, e.to_string()))?,
        None => Role::Customer,
    };
    Ok(Some(Actor::new(id, role)))
}

impl FromRequestParts<ServerState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(CurrentActor(*actor));
        }

        match actor_from_headers(&parts.headers) {
            Ok(Some(actor)) => {
                parts.extensions.insert(actor);
                Ok(CurrentActor(actor))
            }
            Ok(None) => {
                tracing::warn!(target: "security", uri = %parts.uri, "Missing actor headers");
                Err(AppError::not_authenticated())
            }
            Err(e) => {
                tracing::warn!(target: "security", uri = %parts.uri, error = %e, "Malformed actor headers");
                Err(e)
            }
        }
    }
}

impl FromRequestParts<ServerState> for MaybeActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(actor_from_headers(&parts.headers)?))
    }
}

/// Reject actors outside `roles`
pub fn require_role(actor: &Actor, roles: &[Role]) -> Result<(), AppError> {
    if actor.has_any_role(roles) {
        return Ok(());
    }
    tracing::warn!(
        target: "security",
        actor_id = actor.id,
        role = %actor.role,
        "Role check failed"
    );
    let required: Vec<&str> = roles.iter().map(Role::as_str).collect();
    Err(AppError::with_message(
        ErrorCode::RoleRequired,
        format!("Requires one of: {}", required.join(", ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            map.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        map
    }

    #[test]
    fn test_parse_actor() {
        let actor = actor_from_headers(&headers(Some("42"), Some("cook")))
            .unwrap()
            .unwrap();
        assert_eq!(actor, Actor::new(42, Role::Cook));

        let actor = actor_from_headers(&headers(Some("7"), None)).unwrap().unwrap();
        assert_eq!(actor.role, Role::Customer);

        assert!(actor_from_headers(&headers(None, Some("admin"))).unwrap().is_none());
    }

    #[test]
    fn test_malformed_actor() {
        let err = actor_from_headers(&headers(Some("abc"), None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidActor);
        let err = actor_from_headers(&headers(Some("1"), Some("chef"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidActor);
    }

    #[test]
    fn test_require_role() {
        let cook = Actor::new(1, Role::Cook);
        assert!(require_role(&cook, &[Role::Cook, Role::Admin]).is_ok());
        let err = require_role(&cook, &[Role::Admin]).unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
    }
}
