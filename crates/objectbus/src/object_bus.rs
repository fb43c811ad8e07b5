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

//! The [`ObjectBus`] trait: the discovery engine, change dispatcher, and request router are
//! written against this rather than against `zbus` directly, so they can run against an
//! in-memory fake in tests.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use indexmap::IndexMap;
use vebus_core::Value;

use crate::error::ObjectBusError;

/// One of the three signals the bridge reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBusEvent {
    /// A single property changed on `service_id` at `path`.
    PropertyChanged {
        service_id: String,
        path: String,
        value: Value,
    },
    /// A bulk update of multiple paths under `service_id`'s root.
    ItemsChanged {
        service_id: String,
        items: IndexMap<String, Value>,
    },
    /// A service's bus owner changed: gained (`new_owner` non-empty) or lost (`old_owner`
    /// non-empty, `new_owner` empty).
    NameOwnerChanged {
        name: String,
        old_owner: String,
        new_owner: String,
    },
}

pub type EventStream = Pin<Box<dyn Stream<Item = ObjectBusEvent> + Send>>;

/// Transport-level operations against the object bus.
#[async_trait]
pub trait ObjectBus: Send + Sync {
    /// All currently registered service names.
    async fn list_names(&self) -> Result<Vec<String>, ObjectBusError>;

    /// The unique bus id currently owning `service`.
    async fn name_owner(&self, service: &str) -> Result<String, ObjectBusError>;

    /// Reads a single bus-item value.
    async fn get_value(&self, service: &str, path: &str) -> Result<Value, ObjectBusError>;

    /// Writes a single bus-item value.
    async fn set_value(&self, service: &str, path: &str, value: Value) -> Result<(), ObjectBusError>;

    /// Raw introspection XML for `path` on `service`.
    async fn introspect(&self, service: &str, path: &str) -> Result<String, ObjectBusError>;

    /// A merged stream of `PropertiesChanged`, `ItemsChanged`, and `NameOwnerChanged` signals.
    fn events(&self) -> EventStream;
}
