//! Opaque record identifiers for the tambo survey store.
//!
//! Every row in every section table is keyed by a random v4 UUID kept in its
//! string form. A farm's record id doubles as the foreign key its children
//! carry, so [`RecordId`] and [`FarmId`] convert into each other freely.
//!
//! Parsed identifiers are stored in canonical form (lower-case, hyphenated)
//! so the same UUID written upper-case, braced or as a URN keys the same row.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error returned when parsing a UUID-backed identifier fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    message: String,
}

impl IdParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdParseError {}

macro_rules! define_record_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                let value = value.trim();
                let uuid = Uuid::parse_str(value)
                    .map_err(|e| IdParseError::new(format!("Invalid {} '{}': {}", $label, value, e)))?;
                Ok(Self(uuid.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
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
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_record_id!(
    /// Primary key of a row in any section table.
    RecordId,
    "record ID"
);
define_record_id!(
    /// Identifier of a farm (the root entity), as referenced by child rows.
    FarmId,
    "farm ID"
);

impl From<RecordId> for FarmId {
    fn from(id: RecordId) -> Self {
        Self(id.0)
    }
}

impl From<FarmId> for RecordId {
    fn from(id: FarmId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique_uuids() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = FarmId::parse("not-a-uuid").unwrap_err();
        assert!(err.to_string().contains("farm ID"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = RecordId::new();
        let parsed: RecordId = format!("  {}\n", id).parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_canonicalizes_spellings() {
        let id = RecordId::new();
        let upper = id.as_str().to_uppercase();
        let braced = format!("{{{}}}", id);
        let urn = format!("urn:uuid:{}", id);
        let simple = id.as_str().replace('-', "");

        for spelling in [upper, braced, urn, simple] {
            assert_eq!(RecordId::parse(&spelling).unwrap(), id, "{}", spelling);
        }
    }

    #[test]
    fn test_deserialize_validates_and_canonicalizes() {
        let id = FarmId::new();
        let json = format!("\"{}\"", id.as_str().to_uppercase());
        let back: FarmId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<FarmId>("\"nope\"").is_err());
    }

    #[test]
    fn test_farm_and_record_ids_convert() {
        let farm = FarmId::new();
        let record: RecordId = farm.clone().into();
        assert_eq!(record.as_str(), farm.as_str());
        assert_eq!(FarmId::from(record), farm);
    }

    #[test]
    fn test_serde_is_a_plain_string() {
        let id = RecordId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
