use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The authenticated actor making a request.
///
/// There is no ambient "current user": handlers receive a `Principal` from
/// authentication and pass it by reference into every store and gate call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub login: String,
    pub admin: bool,
}

impl Principal {
    pub fn user(id: UserId, login: impl Into<String>) -> Self {
        Self { id, login: login.into(), admin: false }
    }

    pub fn admin(id: UserId, login: impl Into<String>) -> Self {
        Self { id, login: login.into(), admin: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let u = Principal::user(UserId(1), "alice");
        assert_eq!(u.id, UserId(1));
        assert!(!u.admin);
        assert!(Principal::admin(UserId(2), "root").admin);
    }
}
