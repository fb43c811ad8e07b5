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

//! Identifiers for the object-bus/broker bridge's data model.
//!
//! `ServiceName` is a dotted object-bus service name; `SystemId` is the opaque portal id that
//! forms the second segment of every topic; `DeviceInstance` disambiguates multiple running
//! instances of the same service type.

use std::fmt;

use serde::{Deserialize, Serialize};
use vebus_core::correctness::check_non_empty_string;

/// The fixed prefix every service name handled by this bridge must carry.
pub const SERVICE_PREFIX: &str = "com.victronenergy.";

/// `(service_type, path)` pairs that must never be surfaced as topics.
pub const BLOCKED_ITEMS: &[(&str, &str)] = &[
    ("vebus", "/Interfaces/Mk2/Tunnel"),
    ("paygo", "/LVD/Threshold"),
];

/// Returns true if `(service_type, path)` is on the fixed block list.
#[must_use]
pub fn is_blocked(service_type: &str, path: &str) -> bool {
    BLOCKED_ITEMS
        .iter()
        .any(|(t, p)| *t == service_type && *p == path)
}

/// The opaque portal/site identifier used as the second segment of every topic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemId(String);

impl SystemId {
    /// Creates a new [`SystemId`].
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is empty or whitespace.
    pub fn new(value: impl Into<String>) -> anyhow::Result<Self> {
        let value = value.into();
        check_non_empty_string(&value, "SystemId")?;
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A device instance number, disambiguating multiple services of the same type.
///
/// Defaults to `0` when a service does not expose `/DeviceInstance`.
pub type DeviceInstance = u32;

/// A fully qualified object-bus service name, e.g. `com.victronenergy.system`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Parses a service name, requiring the [`SERVICE_PREFIX`] and at least three dotted
    /// segments (so that a service type can be extracted).
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not begin with [`SERVICE_PREFIX`] or lacks a service
    /// type segment.
    pub fn parse(value: impl Into<String>) -> anyhow::Result<Self> {
        let value = value.into();
        if !value.starts_with(SERVICE_PREFIX) {
            anyhow::bail!("`{value}` is not a {SERVICE_PREFIX}* service");
        }
        if value.splitn(3, '.').nth(2).is_none() {
            anyhow::bail!("`{value}` has no service type segment");
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The third dotted segment, e.g. `system` for `com.victronenergy.system`.
    ///
    /// # Panics
    ///
    /// Panics if the name was not constructed through [`ServiceName::parse`] (invariant
    /// guaranteed by the constructor).
    #[must_use]
    pub fn service_type(&self) -> &str {
        self.0
            .splitn(3, '.')
            .nth(2)
            .expect(vebus_core::correctness::FAILED)
    }

    /// The short form `<service-type>/<device-instance>`.
    #[must_use]
    pub fn short_name(&self, device_instance: DeviceInstance) -> String {
        format!("{}/{device_instance}", self.service_type())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ensures `path` begins with `/`, inserting one if absent.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// The internal unique key `<service-name><path>`.
#[must_use]
pub fn make_uid(service: &ServiceName, path: &str) -> String {
    format!("{service}{}", normalize_path(path))
}

/// Builds the full topic `N/<system-id>/<service-type>/<device-instance><path>`.
#[must_use]
pub fn full_topic(
    system_id: &SystemId,
    service_type: &str,
    device_instance: DeviceInstance,
    path: &str,
) -> String {
    format!(
        "N/{system_id}/{service_type}/{device_instance}{}",
        normalize_path(path)
    )
}

/// The system's own serial-number topic, which is published once and never retracted.
#[must_use]
pub fn serial_topic(system_id: &SystemId) -> String {
    format!("N/{system_id}/system/0/Serial")
}
