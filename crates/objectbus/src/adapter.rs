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

//! The `zbus`-backed [`ObjectBus`] implementation.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use indexmap::IndexMap;
use tracing::{debug, warn};
use vebus_core::Value;
use zbus::{Connection, MatchRule, MessageStream, MessageType, fdo};

use crate::error::ObjectBusError;
use crate::introspect::BUS_ITEM_INTERFACE;
use crate::object_bus::{EventStream, ObjectBus, ObjectBusEvent};
use crate::variant::{unwrap_variant, wrap_variant};

/// A live connection to a D-Bus session, system, or explicit-address bus.
#[derive(Debug, Clone)]
pub struct ZbusObjectBus {
    connection: Connection,
}

impl ZbusObjectBus {
    /// Connects to `address` if given, otherwise the session bus when `DBUS_SESSION_BUS_ADDRESS`
    /// is set, falling back to the system bus.
    pub async fn connect(address: Option<&str>) -> anyhow::Result<Self> {
        let connection = match address {
            Some(addr) => zbus::connection::Builder::address(addr)?.build().await?,
            None if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some() => {
                Connection::session().await?
            }
            None => Connection::system().await?,
        };

        Self::subscribe_match_rules(&connection).await?;
        Ok(Self { connection })
    }

    async fn subscribe_match_rules(connection: &Connection) -> anyhow::Result<()> {
        let dbus = fdo::DBusProxy::new(connection).await?;
        for rule in [
            MatchRule::builder()
                .msg_type(MessageType::Signal)
                .interface(BUS_ITEM_INTERFACE)?
                .member("PropertiesChanged")?
                .build(),
            MatchRule::builder()
                .msg_type(MessageType::Signal)
                .interface(BUS_ITEM_INTERFACE)?
                .member("ItemsChanged")?
                .path("/")?
                .build(),
            MatchRule::builder()
                .msg_type(MessageType::Signal)
                .interface("org.freedesktop.DBus")?
                .member("NameOwnerChanged")?
                .build(),
        ] {
            dbus.add_match_rule(rule).await?;
        }
        Ok(())
    }

    async fn proxy<'a>(&'a self, service: &str, path: &str) -> Result<zbus::Proxy<'a>, ObjectBusError> {
        zbus::Proxy::new(&self.connection, service.to_owned(), path.to_owned(), BUS_ITEM_INTERFACE)
            .await
            .map_err(|err| ObjectBusError::classify(service, err))
    }
}

#[async_trait]
impl ObjectBus for ZbusObjectBus {
    async fn list_names(&self) -> Result<Vec<String>, ObjectBusError> {
        let dbus = fdo::DBusProxy::new(&self.connection)
            .await
            .map_err(|err| ObjectBusError::classify("org.freedesktop.DBus", err))?;
        let names = dbus
            .list_names()
            .await
            .map_err(|err| ObjectBusError::classify("org.freedesktop.DBus", err))?;
        Ok(names.into_iter().map(|n| n.to_string()).collect())
    }

    async fn name_owner(&self, service: &str) -> Result<String, ObjectBusError> {
        let dbus = fdo::DBusProxy::new(&self.connection)
            .await
            .map_err(|err| ObjectBusError::classify(service, err))?;
        let owner = dbus
            .get_name_owner(service.try_into().map_err(|_| ObjectBusError::UnknownObjectOrMethod {
                service: service.to_string(),
                detail: "invalid bus name".to_string(),
            })?)
            .await
            .map_err(|err| ObjectBusError::classify(service, err))?;
        Ok(owner.to_string())
    }

    async fn get_value(&self, service: &str, path: &str) -> Result<Value, ObjectBusError> {
        let proxy = self.proxy(service, path).await?;
        let value: zbus::zvariant::OwnedValue = proxy
            .call("GetValue", &())
            .await
            .map_err(|err| ObjectBusError::classify(service, err))?;
        Ok(unwrap_variant(&value))
    }

    async fn set_value(&self, service: &str, path: &str, value: Value) -> Result<(), ObjectBusError> {
        let proxy = self.proxy(service, path).await?;
        let _: i32 = proxy
            .call("SetValue", &(wrap_variant(&value),))
            .await
            .map_err(|err| ObjectBusError::classify(service, err))?;
        Ok(())
    }

    async fn introspect(&self, service: &str, path: &str) -> Result<String, ObjectBusError> {
        let introspectable = fdo::IntrospectableProxy::builder(&self.connection)
            .destination(service.to_owned())
            .map_err(|err| ObjectBusError::classify(service, err.into()))?
            .path(path.to_owned())
            .map_err(|err| ObjectBusError::classify(service, err.into()))?
            .build()
            .await
            .map_err(|err| ObjectBusError::classify(service, err))?;
        introspectable
            .introspect()
            .await
            .map_err(|err| ObjectBusError::classify(service, err))
    }

    fn events(&self) -> EventStream {
        let mut messages = MessageStream::from(&self.connection);
        Box::pin(stream! {
            while let Some(msg) = messages.next().await {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!(%err, "object-bus message stream error");
                        continue;
                    }
                };
                let Some(header) = msg.header().ok() else { continue };
                let Some(member) = header.member().map(|m| m.as_str()) else { continue };

                let event = match member {
                    "PropertiesChanged" => {
                        let Some(service_id) = header.sender().map(|s| s.to_string()) else { continue };
                        let Some(path) = header.path().map(|p| p.to_string()) else { continue };
                        match msg
                            .body()
                            .deserialize::<std::collections::HashMap<String, zbus::zvariant::OwnedValue>>()
                        {
                            Ok(mut changes) => changes.remove("Value").map(|value| ObjectBusEvent::PropertyChanged {
                                service_id,
                                path,
                                value: unwrap_variant(&value),
                            }),
                            Err(err) => {
                                debug!(%err, "malformed PropertiesChanged body");
                                None
                            }
                        }
                    }
                    "ItemsChanged" => {
                        let Some(service_id) = header.sender().map(|s| s.to_string()) else { continue };
                        match msg.body().deserialize::<std::collections::HashMap<
                            String,
                            std::collections::HashMap<String, zbus::zvariant::OwnedValue>,
                        >>() {
                            Ok(raw) => {
                                let mut items = IndexMap::new();
                                for (path, mut changes) in raw {
                                    if let Some(value) = changes.remove("Value") {
                                        items.insert(path, unwrap_variant(&value));
                                    }
                                }
                                Some(ObjectBusEvent::ItemsChanged { service_id, items })
                            }
                            Err(err) => {
                                debug!(%err, "malformed ItemsChanged body");
                                None
                            }
                        }
                    }
                    "NameOwnerChanged" => {
                        match msg.body().deserialize::<(String, String, String)>() {
                            Ok((name, old_owner, new_owner)) => {
                                Some(ObjectBusEvent::NameOwnerChanged { name, old_owner, new_owner })
                            }
                            Err(err) => {
                                debug!(%err, "malformed NameOwnerChanged body");
                                None
                            }
                        }
                    }
                    _ => None,
                };

                if let Some(event) = event {
                    yield event;
                }
            }
        })
    }
}
