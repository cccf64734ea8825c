use crate::record::{Record, RecordType};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name that `Actor::new` treats as the administrator
pub const ADMIN_NAME: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// The identity an authorization decision is made for.
///
/// Actors are also records: user-management policies authorize one actor
/// acting on another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    name: String,
    role: Role,
}

impl Actor {
    pub const RECORD_TYPE: RecordType = RecordType::new("user");

    /// Create an actor, deriving the role from the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let role = if name == ADMIN_NAME {
            Role::Admin
        } else {
            Role::Member
        };
        Self { name, role }
    }

    pub fn with_role(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Order two actors by name. Role does not take part in identity.
pub fn compare(a: &Actor, b: &Actor) -> Ordering {
    a.name.cmp(&b.name)
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for Actor {}

impl PartialOrd for Actor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Actor {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Record for Actor {
    fn record_type(&self) -> RecordType {
        Self::RECORD_TYPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
