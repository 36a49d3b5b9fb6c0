//! Caller identity and the closed set of actor capabilities.
//!
//! Permission checks never inspect a free-form role string; every operation
//! receives an [`Actor`] variant and matches on it.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Header carrying the caller identity. Session/JWT handling is out of scope;
/// the deployment in front of this service is expected to populate it.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Identifier wrapper for directory members (students, staff, admins).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

/// Minimal identity snapshot carried into audit logs and responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: MemberId,
    pub full_name: String,
}

/// A resolved caller, carrying only the capabilities of its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Student(MemberRef),
    Staff(MemberRef),
    Admin(MemberRef),
}

impl Actor {
    pub fn id(&self) -> &MemberId {
        &self.member().id
    }

    pub fn name(&self) -> &str {
        &self.member().full_name
    }

    pub fn member(&self) -> &MemberRef {
        match self {
            Actor::Student(member) | Actor::Staff(member) | Actor::Admin(member) => member,
        }
    }

    pub const fn role(&self) -> Role {
        match self {
            Actor::Student(_) => Role::Student,
            Actor::Staff(_) => Role::Staff,
            Actor::Admin(_) => Role::Admin,
        }
    }

    pub fn as_student(&self) -> Option<&MemberRef> {
        match self {
            Actor::Student(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_staff(&self) -> Option<&MemberRef> {
        match self {
            Actor::Staff(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_admin(&self) -> Option<&MemberRef> {
        match self {
            Actor::Admin(member) => Some(member),
            _ => None,
        }
    }
}

/// Error raised while turning a member id into an [`Actor`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown actor: {0}")]
    Unknown(String),
    #[error("account is disabled: {0}")]
    Inactive(String),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Seam between HTTP routers and the directory: maps a member id to a caller.
pub trait ActorResolver: Send + Sync {
    fn resolve(&self, id: &MemberId) -> Result<Actor, ResolveError>;
}

/// Resolve the caller from request headers, producing a ready-to-return
/// rejection when the header is missing or the id does not resolve.
pub fn resolve_from_headers<R>(resolver: &R, headers: &HeaderMap) -> Result<Actor, Response>
where
    R: ActorResolver + ?Sized,
{
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty());

    let Some(raw) = raw else {
        let body = Json(json!({ "error": format!("{ACTOR_HEADER} header is required") }));
        return Err((StatusCode::UNAUTHORIZED, body).into_response());
    };

    resolver.resolve(&MemberId(raw.to_string())).map_err(|err| {
        let status = match err {
            ResolveError::Unknown(_) | ResolveError::Inactive(_) => StatusCode::UNAUTHORIZED,
            ResolveError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": err.to_string() }));
        (status, body).into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SingleActor;

    impl ActorResolver for SingleActor {
        fn resolve(&self, id: &MemberId) -> Result<Actor, ResolveError> {
            if id.0 == "stf-1" {
                Ok(Actor::Staff(MemberRef {
                    id: id.clone(),
                    full_name: "Ravi Kumar".to_string(),
                }))
            } else {
                Err(ResolveError::Unknown(id.0.clone()))
            }
        }
    }

    #[test]
    fn resolves_known_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, "stf-1".parse().expect("header value"));
        let actor = resolve_from_headers(&SingleActor, &headers).expect("resolves");
        assert_eq!(actor.role(), Role::Staff);
        assert_eq!(actor.name(), "Ravi Kumar");
    }

    #[test]
    fn missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(resolve_from_headers(&SingleActor, &headers).is_err());
    }
}
