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

//! Wrap/unwrap between [`vebus_core::Value`] and D-Bus variants.
//!
//! The bus-item convention represents an invalid/unset value as an empty `ai` (array of int32)
//! variant rather than any native null, so an empty array unwraps to [`Value::Null`] and `Null`
//! wraps back into that same empty-array shape.

use std::collections::HashMap;

use indexmap::IndexMap;
use vebus_core::Value;
use zbus::zvariant::{self, OwnedValue, Signature};

/// Converts a value read off the bus into our internal representation.
///
/// Types outside the small set a bus-item is expected to carry (basic scalars, arrays, and
/// string-keyed dictionaries of the same) are preserved as their textual debug form rather than
/// dropped, so a malformed or unanticipated payload is still visible downstream.
#[must_use]
pub fn unwrap_variant(value: &zvariant::Value<'_>) -> Value {
    match value {
        zvariant::Value::Bool(b) => Value::Bool(*b),
        zvariant::Value::I32(v) => Value::Int32(*v),
        zvariant::Value::U32(v) => Value::Uint32(*v),
        zvariant::Value::I64(v) => Value::Int64(*v),
        zvariant::Value::U64(v) => Value::Uint64(*v),
        zvariant::Value::F64(v) => Value::Double(*v),
        zvariant::Value::Str(s) => Value::Text(s.to_string()),
        zvariant::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().map(unwrap_variant).collect();
            Value::array(items)
        }
        zvariant::Value::Dict(dict) => {
            let mut map = IndexMap::new();
            if let Ok(pairs) = dict.clone().try_into() {
                let pairs: HashMap<String, OwnedValue> = pairs;
                for (k, v) in pairs {
                    map.insert(k, unwrap_variant(&v));
                }
            }
            Value::Map(map)
        }
        zvariant::Value::Value(inner) => unwrap_variant(inner),
        other => Value::Text(format!("{other:?}")),
    }
}

/// Converts our internal representation into a D-Bus variant for a `SetValue` call.
///
/// `Value::Null` becomes the empty `ai` sentinel the bus-item convention uses for "invalid".
#[must_use]
pub fn wrap_variant(value: &Value) -> zvariant::Value<'static> {
    match value {
        Value::Null => zvariant::Value::Array(zvariant::Array::new(Signature::I32)),
        Value::Bool(b) => zvariant::Value::Bool(*b),
        Value::Int32(v) => zvariant::Value::I32(*v),
        Value::Uint32(v) => zvariant::Value::U32(*v),
        Value::Int64(v) => zvariant::Value::I64(*v),
        Value::Uint64(v) => zvariant::Value::U64(*v),
        Value::Double(v) => zvariant::Value::F64(*v),
        Value::Text(s) => zvariant::Value::Str(s.clone().into()),
        Value::Array(items) => {
            let mut array = zvariant::Array::new(Signature::Variant);
            for item in items {
                let _ = array.append(wrap_variant(item));
            }
            zvariant::Value::Array(array)
        }
        Value::Map(map) => {
            let mut dict = zvariant::Dict::new(Signature::Str, Signature::Variant);
            for (k, v) in map {
                let _ = dict.append(
                    zvariant::Value::Str(k.clone().into()),
                    wrap_variant(v),
                );
            }
            zvariant::Value::Dict(dict)
        }
    }
}
