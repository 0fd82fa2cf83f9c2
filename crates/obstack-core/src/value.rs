//! Chart values as a recursive tree, and the deep-merge rules between layers.
//!
//! Chart values arrive from user documents and from the built-in defaults and
//! wiring tables. They are kept as a closed [`Value`] enum so that merge
//! behavior is defined for every pair of variants.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::errors::MergeError;

/// An ordered string-keyed mapping of values.
pub type Mapping = IndexMap<String, Value>;

/// A chart value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key if this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Look up a dotted path (e.g. `"tempo.metricsGenerator.remoteWriteUrl"`).
    ///
    /// Keys that themselves contain dots cannot be addressed this way.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |value, key| value.get(key))
    }
}

/// Look up a dotted path inside a mapping.
pub fn lookup<'a>(mapping: &'a Mapping, path: &str) -> Option<&'a Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let value = mapping.get(head)?;
    match rest {
        Some(rest) => value.pointer(rest),
        None => Some(value),
    }
}

/// Deep-merge `overlay` on top of `base`, returning the merged mapping.
///
/// - Keys present in both as mappings are merged recursively.
/// - Scalars and sequences in `overlay` replace whatever `base` held.
/// - A `null` in `overlay` removes the key, including inside subtrees that
///   `base` does not have yet.
/// - A mapping meeting a non-null non-mapping is a [`MergeError`].
pub fn deep_merge(base: &Mapping, overlay: &Mapping) -> Result<Mapping, MergeError> {
    let mut path = Vec::new();
    merge_mappings(base.clone(), overlay, &mut path)
}

/// Merge a stack of layers in ascending precedence order.
pub fn merge_layers<'a, I>(layers: I) -> Result<Mapping, MergeError>
where
    I: IntoIterator<Item = &'a Mapping>,
{
    let mut path = Vec::new();
    layers
        .into_iter()
        .try_fold(Mapping::new(), |acc, layer| merge_mappings(acc, layer, &mut path))
}

fn merge_mappings(
    mut base: Mapping,
    overlay: &Mapping,
    path: &mut Vec<String>,
) -> Result<Mapping, MergeError> {
    for (key, value) in overlay {
        path.push(key.clone());

        if value.is_null() {
            base.shift_remove(key);
            path.pop();
            continue;
        }

        match base.get_mut(key) {
            Some(Value::Mapping(existing)) => match value {
                Value::Mapping(incoming) => {
                    let merged = merge_mappings(std::mem::take(existing), incoming, path)?;
                    *existing = merged;
                }
                other => {
                    return Err(MergeError::TypeMismatch {
                        path: path.join("."),
                        base: "mapping",
                        overlay: other.kind_name(),
                    });
                }
            },
            Some(existing) if !existing.is_null() && value.is_mapping() => {
                return Err(MergeError::TypeMismatch {
                    path: path.join("."),
                    base: existing.kind_name(),
                    overlay: "mapping",
                });
            }
            Some(existing) => *existing = without_nulls(value),
            None => {
                base.insert(key.clone(), without_nulls(value));
            }
        }

        path.pop();
    }
    Ok(base)
}

/// Copy of `value` with null mapping entries dropped at every depth.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

/// Convert a `serde_json::json!` literal into a [`Mapping`].
///
/// Non-object literals produce an empty mapping.
pub fn mapping_from_json(value: serde_json::Value) -> Mapping {
    match Value::from(value) {
        Value::Mapping(m) => m,
        _ => Mapping::new(),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(mapping) => {
                let mut map = serializer.serialize_map(Some(mapping.len()))?;
                for (k, v) in mapping {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a chart value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(i64::try_from(u).map(Value::Int).unwrap_or(Value::Float(u as f64)))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut mapping = Mapping::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_precedence() {
        let chart = mapping_from_json(json!({ "a": 1, "b": { "c": 2 } }));
        let wiring = mapping_from_json(json!({ "b": { "c": 3 } }));
        let user = mapping_from_json(json!({ "b": { "d": 4 } }));

        let merged = merge_layers([&chart, &wiring, &user]).unwrap();
        assert_eq!(merged, mapping_from_json(json!({ "a": 1, "b": { "c": 3, "d": 4 } })));
    }

    #[test]
    fn test_merge_replaces_sequences() {
        let base = mapping_from_json(json!({ "features": ["a", "b"] }));
        let overlay = mapping_from_json(json!({ "features": ["c"] }));

        let merged = deep_merge(&base, &overlay).unwrap();
        assert_eq!(merged["features"], Value::Sequence(vec![Value::from("c")]));
    }

    #[test]
    fn test_merge_null_removes_key() {
        let base = mapping_from_json(json!({ "a": { "b": 1, "c": 2 } }));
        let overlay = mapping_from_json(json!({ "a": { "b": null } }));

        let merged = deep_merge(&base, &overlay).unwrap();
        assert_eq!(merged, mapping_from_json(json!({ "a": { "c": 2 } })));
    }

    #[test]
    fn test_merge_null_inside_new_subtree_is_dropped() {
        let base = mapping_from_json(json!({ "x": 1 }));
        let overlay = mapping_from_json(json!({ "a": { "b": null, "c": { "d": null, "e": 2 } } }));

        let merged = deep_merge(&base, &overlay).unwrap();
        assert_eq!(
            merged,
            mapping_from_json(json!({ "x": 1, "a": { "c": { "e": 2 } } }))
        );
    }

    #[test]
    fn test_merge_null_inside_mapping_over_null_is_dropped() {
        let base = mapping_from_json(json!({ "tolerations": null }));
        let overlay = mapping_from_json(json!({ "tolerations": { "key": null } }));

        let merged = deep_merge(&base, &overlay).unwrap();
        assert_eq!(merged["tolerations"], Value::Mapping(Mapping::new()));
    }

    #[test]
    fn test_merge_mapping_over_scalar_is_error() {
        let base = mapping_from_json(json!({ "server": { "port": 80 } }));
        let overlay = mapping_from_json(json!({ "server": { "port": { "http": 80 } } }));

        let err = deep_merge(&base, &overlay).unwrap_err();
        match err {
            MergeError::TypeMismatch { path, base, overlay } => {
                assert_eq!(path, "server.port");
                assert_eq!(base, "int");
                assert_eq!(overlay, "mapping");
            }
        }
    }

    #[test]
    fn test_merge_scalar_over_mapping_is_error() {
        let base = mapping_from_json(json!({ "persistence": { "enabled": true } }));
        let overlay = mapping_from_json(json!({ "persistence": false }));

        assert!(matches!(
            deep_merge(&base, &overlay),
            Err(MergeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_merge_mapping_over_null_is_allowed() {
        let base = mapping_from_json(json!({ "tolerations": null }));
        let overlay = mapping_from_json(json!({ "tolerations": { "key": "x" } }));

        let merged = deep_merge(&base, &overlay).unwrap();
        assert!(merged["tolerations"].is_mapping());
    }

    #[test]
    fn test_merge_preserves_base_key_order() {
        let base = mapping_from_json(json!({ "z": 1, "a": 2 }));
        let overlay = mapping_from_json(json!({ "m": 3, "z": 4 }));

        let merged = deep_merge(&base, &overlay).unwrap();
        let keys: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_pointer_lookup() {
        let value = Value::from(json!({ "tempo": { "metricsGenerator": { "enabled": true } } }));
        assert_eq!(
            value.pointer("tempo.metricsGenerator.enabled"),
            Some(&Value::Bool(true))
        );
        assert_eq!(value.pointer("tempo.missing"), None);
    }

    #[test]
    fn test_deserialize_yaml() {
        let value: Value = serde_yaml::from_str("a: 1\nb: [x, 2.5]\nc: ~\n").unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping["a"], Value::Int(1));
        assert_eq!(
            mapping["b"],
            Value::Sequence(vec![Value::from("x"), Value::Float(2.5)])
        );
        assert!(mapping["c"].is_null());
    }

    #[test]
    fn test_serialize_round_trips_through_json() {
        let value = Value::from(json!({ "a": [1, true, "s"], "b": { "c": null } }));
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"a":[1,true,"s"],"b":{"c":null}}"#);
    }
}
