// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A dynamically typed value observed on the object bus.
//!
//! The object bus exposes properties whose static type is not known ahead of time, so reads,
//! writes, and change signals all carry this tagged variant rather than a Rust-native type.
//! Unlike the bus's own variant representation, [`Value`] is transport-agnostic: the D-Bus
//! adapter is the only component that converts to and from it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A dynamically typed value, as exchanged with the object bus and serialized to the broker.
///
/// `Value::Null` is the canonical "no value" / retraction marker. An empty [`Value::Array`] is
/// never constructed directly; [`Value::array`] collapses it to `Value::Null` to mirror what is
/// observed on the broker when a D-Bus method returns an empty array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    Text(String),
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Builds an array value, collapsing an empty vector to [`Value::Null`].
    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        if items.is_empty() {
            Self::Null
        } else {
            Self::Array(items)
        }
    }

    /// True if this value is the null/retraction marker.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns this value as an `i64`, if it holds an integral variant that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Uint32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            Self::Uint64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns this value as a map, if it holds one.
    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns this value as a string slice, if it holds one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Encodes this value as the wire payload the broker adapter publishes: an empty payload for
    /// [`Value::Null`] (retraction), otherwise the `{"value": V}` envelope.
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        if self.is_null() {
            Vec::new()
        } else {
            serde_json::to_vec(&ValueEnvelope::new(self.clone())).expect("Value always serializes")
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// The `{"value": V}` envelope published to, and parsed from, the broker.
///
/// A missing `value` field on decode is treated the same as `Value::Null`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueEnvelope {
    #[serde(default)]
    pub value: Value,
}

impl ValueEnvelope {
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_array_collapses_to_null() {
        assert_eq!(Value::array(vec![]), Value::Null);
        assert!(!matches!(Value::array(vec![Value::Bool(true)]), Value::Null));
    }

    #[test]
    fn test_envelope_round_trips_through_json() {
        let env = ValueEnvelope::new(Value::Int32(1));
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"{"value":1}"#);

        let back: ValueEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, Value::Int32(1));
    }

    #[test]
    fn test_envelope_defaults_missing_value_to_null() {
        let back: ValueEnvelope = serde_json::from_str("{}").unwrap();
        assert!(back.value.is_null());
    }

    #[test]
    fn test_null_payload_is_empty() {
        assert!(Value::Null.to_payload().is_empty());
    }

    #[test]
    fn test_non_null_payload_is_envelope_json() {
        assert_eq!(Value::Int32(1).to_payload(), br#"{"value":1}"#);
    }
}
