//! Tri-state optional field
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use serde::{Serialize, Serializer};

/// A field that can be missing, explicitly `null`, or set
///
/// Some rules care about key presence rather than value, so absence and
/// `null` are kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Presence<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    /// Key present, with or without a value
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Key present with a non-null value
    pub fn is_set(&self) -> bool {
        matches!(self, Presence::Value(_))
    }

    pub fn as_ref(&self) -> Presence<&T> {
        match self {
            Presence::Absent => Presence::Absent,
            Presence::Null => Presence::Null,
            Presence::Value(value) => Presence::Value(value),
        }
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Presence::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Presence::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Presence<U> {
        match self {
            Presence::Absent => Presence::Absent,
            Presence::Null => Presence::Null,
            Presence::Value(value) => Presence::Value(f(value)),
        }
    }
}

impl<T> From<Option<T>> for Presence<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Presence::Null, Presence::Value)
    }
}

/// `Absent` must be skipped by the container with
/// `#[serde(skip_serializing_if = "Presence::is_absent")]`
impl<T: Serialize> Serialize for Presence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Presence::Value(value) => value.serialize(serializer),
            Presence::Absent | Presence::Null => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Holder {
        #[serde(skip_serializing_if = "Presence::is_absent")]
        field: Presence<String>,
    }

    #[test]
    fn test_presence_serialization() {
        let absent = Holder { field: Presence::Absent };
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({}));

        let null = Holder { field: Presence::Null };
        assert_eq!(serde_json::to_value(&null).unwrap(), json!({"field": null}));

        let set = Holder { field: Presence::Value("x".into()) };
        assert_eq!(serde_json::to_value(&set).unwrap(), json!({"field": "x"}));
    }

    #[test]
    fn test_presence_states() {
        let null: Presence<u8> = Presence::Null;
        assert!(null.is_present());
        assert!(!null.is_set());
        assert_eq!(Presence::Value(3).into_option(), Some(3));
        assert_eq!(Presence::from(None::<u8>), Presence::Null);
    }
}
