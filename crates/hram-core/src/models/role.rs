//! The closed set of access roles.

use serde::{Deserialize, Serialize};

/// One of the fixed access levels an employee can hold.
///
/// The set is closed: roles are not user-definable, and every
/// role-permission assignment references one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    TeamLeader,
    Manager,
    Superadmin,
}

impl Role {
    /// All roles, in ascending privilege order.
    pub const ALL: [Role; 4] = [
        Role::Staff,
        Role::TeamLeader,
        Role::Manager,
        Role::Superadmin,
    ];

    /// The wire/storage representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::TeamLeader => "team_leader",
            Role::Manager => "manager",
            Role::Superadmin => "superadmin",
        }
    }

    /// Parse the wire/storage representation. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "staff" => Some(Role::Staff),
            "team_leader" => Some(Role::TeamLeader),
            "manager" => Some(Role::Manager),
            "superadmin" => Some(Role::Superadmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_role() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("ceo"), None);
    }
}
