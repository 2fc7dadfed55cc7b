use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TypeError;
use crate::scalar::Scalar;

/// Declares a `u64`-backed record identifier.
///
/// Identifiers serialize as bare integers and deserialize from either an
/// integer or a numeric string, since API clients send both.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| TypeError::InvalidId(s.to_string()))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = Scalar::deserialize(deserializer)?;
                raw.as_i64()
                    .and_then(|n| u64::try_from(n).ok())
                    .map(Self)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "invalid {}: {}",
                            stringify!($name),
                            raw
                        ))
                    })
            }
        }
    };
}

record_id!(
    /// A user account (also the id of an authenticated [`crate::Principal`]).
    UserId
);
record_id!(
    /// A project: the container that time entries and queries are scoped under.
    ProjectId
);
record_id!(
    /// An issue: a leaf resource nested under one project.
    IssueId
);
record_id!(RoleId);
record_id!(TrackerId);
record_id!(
    /// A time-entry activity (the category of logged time).
    ActivityId
);
record_id!(CustomFieldId);
record_id!(QueryId);
record_id!(TimeEntryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let a: ProjectId = serde_json::from_str("3").unwrap();
        let b: ProjectId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(), 3);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!(serde_json::from_str::<IssueId>("-1").is_err());
        assert!(serde_json::from_str::<IssueId>("\"abc\"").is_err());
        assert!(serde_json::from_str::<IssueId>("1.5").is_err());
    }

    #[test]
    fn serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&UserId(9)).unwrap(), "9");
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("12".parse::<QueryId>().unwrap(), QueryId(12));
        assert_eq!(
            "x".parse::<QueryId>(),
            Err(TypeError::InvalidId("x".into()))
        );
    }
}
