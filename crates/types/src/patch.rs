//! Three-state update fields.
//!
//! `Option<T>` cannot tell "the client did not send this field" apart from "the client sent
//! `null`". Update contracts need both: an absent field leaves the stored value alone, while an
//! explicit `null` clears it.
//!
//! Use with `#[serde(default, skip_serializing_if = "Patch::is_unset")]` so that absent keys
//! deserialize as [`Patch::Unset`] and are omitted again on serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field in an update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key was absent: leave the current value unchanged.
    Unset,
    /// Key was present with `null`: clear the current value.
    Null,
    /// Key was present with a value: replace the current value.
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Patch::Null)
    }

    /// Returns the supplied value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            Patch::Unset | Patch::Null => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    /// Applies the patch to a nullable field.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Unset => {}
            Patch::Null => *target = None,
            Patch::Value(v) => *target = Some(v),
        }
    }

    /// Applies the patch to a non-nullable field. `Null` is treated like `Unset`; contracts
    /// reject `null` on such fields before they get here.
    pub fn apply_required(self, target: &mut T) {
        if let Patch::Value(v) = self {
            *target = v;
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Unset | Patch::Null => serializer.serialize_none(),
            Patch::Value(v) => serializer.serialize_some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Update {
        #[serde(default, skip_serializing_if = "Patch::is_unset")]
        description: Patch<String>,
    }

    #[test]
    fn absent_key_is_unset() {
        let update: Update = serde_json::from_str("{}").expect("parse");
        assert_eq!(update.description, Patch::Unset);
    }

    #[test]
    fn null_is_distinct_from_absent() {
        let update: Update = serde_json::from_str(r#"{"description":null}"#).expect("parse");
        assert_eq!(update.description, Patch::Null);
    }

    #[test]
    fn value_is_kept() {
        let update: Update = serde_json::from_str(r#"{"description":"Antenatal"}"#).expect("parse");
        assert_eq!(update.description, Patch::Value("Antenatal".to_string()));
    }

    #[test]
    fn serialization_preserves_the_three_states() {
        let unset = serde_json::to_string(&Update::default()).expect("serialize");
        assert_eq!(unset, "{}");

        let null = serde_json::to_string(&Update {
            description: Patch::Null,
        })
        .expect("serialize");
        assert_eq!(null, r#"{"description":null}"#);

        let reparsed: Update = serde_json::from_str(&null).expect("reparse");
        assert_eq!(reparsed.description, Patch::Null);
    }

    #[test]
    fn apply_to_nullable_field() {
        let mut current = Some("old".to_string());
        Patch::Unset.apply_to(&mut current);
        assert_eq!(current.as_deref(), Some("old"));

        Patch::Value("new".to_string()).apply_to(&mut current);
        assert_eq!(current.as_deref(), Some("new"));

        Patch::Null.apply_to(&mut current);
        assert_eq!(current, None);
    }

    #[test]
    fn apply_required_ignores_null() {
        let mut duration = 30;
        Patch::Null.apply_required(&mut duration);
        assert_eq!(duration, 30);
        Patch::Value(45).apply_required(&mut duration);
        assert_eq!(duration, 45);
    }
}
