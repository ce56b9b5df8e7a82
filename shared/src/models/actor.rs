//! Actor Model
//!
//! Identity is issued upstream; the core only needs who is acting and in
//! which role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor role (客户 / 服务员 / 厨师 / 收银 / 管理员)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Waiter,
    Cook,
    Cashier,
    Admin,
}

impl Role {
    /// Any role other than customer
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Customer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Waiter => "waiter",
            Role::Cook => "cook",
            Role::Cashier => "cashier",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised role string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "waiter" => Ok(Role::Waiter),
            "cook" => Ok(Role::Cook),
            "cashier" => Ok(Role::Cashier),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The principal performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn customer(id: i64) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Staff may see every order/reservation; customers only their own
    pub fn can_view(&self, owner_id: i64) -> bool {
        self.role.is_staff() || self.id == owner_id
    }

    /// Check whether the actor holds one of the given roles
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("Cook".parse::<Role>().unwrap(), Role::Cook);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("chef".parse::<Role>().is_err());
    }

    #[test]
    fn test_visibility() {
        let customer = Actor::customer(7);
        assert!(customer.can_view(7));
        assert!(!customer.can_view(8));
        assert!(Actor::new(1, Role::Waiter).can_view(8));
    }
}
