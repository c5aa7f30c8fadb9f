//! Actor and role contract
//!
//! The server resolves a request to an [`Actor`]; everything else only asks
//! whether that actor may do something.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Stored column value
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(Error::Validation(format!("unknown role: {}", other))),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Gate an action on the actor holding `role`
///
/// Admins satisfy every role check.
pub fn require_role(actor: &Actor, role: Role) -> Result<()> {
    if actor.role == role || actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Authorization(format!(
            "{} role required",
            role.as_str().to_lowercase()
        )))
    }
}

/// Resolve an optional actor, failing when nobody is signed in
pub fn current_actor(actor: Option<Actor>) -> Result<Actor> {
    actor.ok_or(Error::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_cannot_pass_admin_gate() {
        let user = Actor::new("u1", Role::User);
        let err = require_role(&user, Role::Admin).unwrap_err();
        assert!(matches!(err, Error::Authorization(_)));
    }

    #[test]
    fn test_admin_passes_every_gate() {
        let admin = Actor::new("a1", Role::Admin);
        assert!(require_role(&admin, Role::Admin).is_ok());
        assert!(require_role(&admin, Role::User).is_ok());
    }

    #[test]
    fn test_missing_actor_is_unauthenticated() {
        assert!(matches!(current_actor(None), Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "USER");
        assert!("guest".parse::<Role>().is_err());
    }
}
