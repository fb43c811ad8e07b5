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

//! Object-bus errors, classified the way the discovery engine and request router need them
//!.

use thiserror::Error;

/// A D-Bus call failure, classified by the well-known error name it carries.
#[derive(Debug, Error)]
pub enum ObjectBusError {
    /// `org.freedesktop.DBus.Error.UnknownObject` or `.UnknownMethod`: the object or method does
    /// not exist on the service. Device-instance probing and bulk-value reads both fold this
    /// into a default rather than propagating it.
    #[error("unknown object or method on {service}: {detail}")]
    UnknownObjectOrMethod { service: String, detail: String },

    /// `org.freedesktop.DBus.Error.ServiceUnknown` or `.Disconnected`: the service vanished
    /// mid-call. Benign during a scan.
    #[error("service unreachable: {service}")]
    ServiceUnreachable { service: String },

    /// `org.freedesktop.DBus.Error.NoReply`: the service did not answer in time. Benign during a
    /// scan.
    #[error("no reply from {service}")]
    NoReply { service: String },

    /// Any other D-Bus error name, or a transport-level failure.
    #[error("object-bus call to {service} failed: {source}")]
    Other {
        service: String,
        #[source]
        source: zbus::Error,
    },
}

impl ObjectBusError {
    /// True for the two error kinds a discovery scan should swallow and simply abort for that
    /// service, rather than propagate.
    #[must_use]
    pub fn is_benign_during_scan(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnreachable { .. } | Self::NoReply { .. }
        )
    }

    /// True for the error kinds that should be treated as "device instance 0" / "no item
    /// listing" rather than propagated.
    #[must_use]
    pub fn is_unknown_object_or_method(&self) -> bool {
        matches!(self, Self::UnknownObjectOrMethod { .. })
    }

    pub(crate) fn classify(service: &str, err: zbus::Error) -> Self {
        let name = match &err {
            zbus::Error::MethodError(name, _, _) => Some(name.as_str()),
            _ => None,
        };

        match name {
            Some("org.freedesktop.DBus.Error.UnknownObject" | "org.freedesktop.DBus.Error.UnknownMethod") => {
                Self::UnknownObjectOrMethod {
                    service: service.to_string(),
                    detail: err.to_string(),
                }
            }
            Some("org.freedesktop.DBus.Error.ServiceUnknown" | "org.freedesktop.DBus.Error.Disconnected") => {
                Self::ServiceUnreachable {
                    service: service.to_string(),
                }
            }
            Some("org.freedesktop.DBus.Error.NoReply") => Self::NoReply {
                service: service.to_string(),
            },
            _ => Self::Other {
                service: service.to_string(),
                source: err,
            },
        }
    }
}
