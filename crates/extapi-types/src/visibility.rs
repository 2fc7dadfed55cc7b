use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Who can see a saved query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Visibility {
    /// Only the owner.
    Private,
    /// Members holding one of the query's roles.
    Roles,
    /// Everyone who can see the project (or everyone, for global queries).
    Public,
}

impl Visibility {
    pub fn code(self) -> i64 {
        match self {
            Self::Private => 0,
            Self::Roles => 1,
            Self::Public => 2,
        }
    }

    pub fn is_private(self) -> bool {
        self == Self::Private
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Private
    }
}

impl TryFrom<i64> for Visibility {
    type Error = TypeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Private),
            1 => Ok(Self::Roles),
            2 => Ok(Self::Public),
            other => Err(TypeError::InvalidVisibility(other)),
        }
    }
}

impl From<Visibility> for i64 {
    fn from(v: Visibility) -> Self {
        v.code()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Roles => write!(f, "roles"),
            Self::Public => write!(f, "public"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        for v in [Visibility::Private, Visibility::Roles, Visibility::Public] {
            assert_eq!(Visibility::try_from(v.code()).unwrap(), v);
        }
        assert_eq!(Visibility::try_from(7), Err(TypeError::InvalidVisibility(7)));
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Visibility::Public).unwrap(), "2");
        let v: Visibility = serde_json::from_str("0").unwrap();
        assert!(v.is_private());
    }
}
