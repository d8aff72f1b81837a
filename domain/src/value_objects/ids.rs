//! Identity newtypes. Every entity is identified by a ULID wrapped in a
//! per-entity type so an `ExecutionId` can never be passed where a
//! `ScheduleId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            pub fn from_ulid(id: Ulid) -> Self {
                Self(id)
            }

            pub fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Ulid::from_string(s)?))
            }
        }
    };
}

id_type!(ExecutionId);
id_type!(TestId);
id_type!(DomainId);
id_type!(UserId);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_string() {
        let id = ExecutionId::new();
        let parsed = ExecutionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_of_different_entities_are_distinct_types() {
        let exec = ExecutionId::new();
        let test = TestId::new();
        assert_ne!(exec.to_string(), test.to_string());
    }
}
