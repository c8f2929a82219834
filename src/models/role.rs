use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Procurement roles, ordered by permission level.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Role {
    #[default]
    Staff = 1,
    Manager = 2,
    Director = 3,
    Admin = 4,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Staff, Role::Manager, Role::Director, Role::Admin];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// "Manager and above" style checks.
    pub fn at_least(self, min: Role) -> bool {
        self.level() >= min.level()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Staff => write!(f, "staff"),
            Role::Manager => write!(f, "manager"),
            Role::Director => write!(f, "director"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "director" => Ok(Role::Director),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_order() {
        assert!(Role::Admin.at_least(Role::Manager));
        assert!(Role::Manager.at_least(Role::Manager));
        assert!(!Role::Staff.at_least(Role::Manager));
        assert!(Role::Staff < Role::Director);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Manager".parse::<Role>(), Ok(Role::Manager));
        assert_eq!(" ADMIN ".parse::<Role>(), Ok(Role::Admin));
        assert!("principal".parse::<Role>().is_err());
    }

    #[test]
    fn test_default_is_least_privileged() {
        assert_eq!(Role::default(), Role::Staff);
        assert_eq!(Role::default().level(), 1);
    }
}
