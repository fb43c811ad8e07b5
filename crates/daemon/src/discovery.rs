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

//! Service discovery: the startup scan of every already-running service, the per-service
//! introspection fallback, and reacting to a service's bus owner appearing or disappearing.

use std::future::Future;
use std::pin::Pin;

use vebus_core::Value;
use vebus_model::{ServiceName, SystemId};
use vebus_objectbus::{ObjectBus, ObjectBusError, introspect};

use crate::bridge::Bridge;
use crate::registrator::CloudRegistrator;

const SERVICE_PREFIX: &str = vebus_model::SERVICE_PREFIX;

/// Resolves the system id this bridge runs as: `override_id` if one was given on the command
/// line, otherwise `com.victronenergy.system`'s `/Serial` property.
///
/// # Errors
///
/// Returns an error if no override was given and the system service cannot be reached, or its
/// serial number is not a string.
pub async fn resolve_system_id(
    object_bus: &impl ObjectBus,
    override_id: Option<String>,
) -> anyhow::Result<SystemId> {
    if let Some(id) = override_id {
        return SystemId::new(id);
    }

    let value = object_bus
        .get_value("com.victronenergy.system", "/Serial")
        .await
        .map_err(|err| anyhow::anyhow!("could not read system serial number: {err}"))?;
    let Value::Text(serial) = value else {
        anyhow::bail!("system serial number was not a string: {value:?}");
    };
    SystemId::new(serial)
}

impl<O, K, R> Bridge<O, K, R>
where
    O: ObjectBus,
    K: vebus_broker::Broker,
    R: CloudRegistrator,
{
    /// Walks every already-registered service on the bus and records its current values.
    pub async fn initial_scan(&mut self) -> anyhow::Result<()> {
        let names = self.object_bus.list_names().await?;
        for name in names {
            if !name.starts_with(SERVICE_PREFIX) {
                continue;
            }
            let Ok(service) = ServiceName::parse(name.clone()) else {
                continue;
            };
            match self.object_bus.name_owner(&name).await {
                Ok(owner) => self.tables.record_owner(owner, service.clone()),
                Err(err) => {
                    tracing::debug!(%name, %err, "could not resolve owner during initial scan");
                }
            }
            self.scan_service(&service, false).await?;
        }
        Ok(())
    }

    /// Scans `service`: resolves its device instance, records its short name, and either reads
    /// a bulk item listing or falls back to walking its introspection tree.
    ///
    /// `publish` controls whether newly discovered values are immediately queued for the broker;
    /// this is `false` during the initial scan (the post-scan connect sequence republishes
    /// everything anyway) and `true` when a service appears after an owner change.
    ///
    /// Returns an error for any object-bus failure that is neither the unknown-object/method
    /// case (folded into device-instance `0` / an introspection fallback) nor benign during a
    /// scan (service gone, disconnected, no reply) — those two are the only kinds this scan is
    /// allowed to absorb.
    pub async fn scan_service(&mut self, service: &ServiceName, publish: bool) -> Result<(), ObjectBusError> {
        tracing::info!(%service, "scanning service");

        let device_instance = match self.object_bus.get_value(service.as_str(), "/DeviceInstance").await {
            Ok(value) => value.as_i64().and_then(|v| u32::try_from(v).ok()).unwrap_or(0),
            Err(err) if err.is_unknown_object_or_method() => 0,
            Err(err) if err.is_benign_during_scan() => {
                tracing::info!(%service, %err, "service disappeared while being scanned");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.tables
            .register_service(service.short_name(device_instance), service.clone());

        match self.object_bus.get_value(service.as_str(), "/").await {
            Ok(Value::Map(items)) => {
                for (path, value) in items {
                    let outcome = self.tables.add_item(service, device_instance, &path, value.clone());
                    if publish
                        && let Some(topic) = outcome.topic()
                    {
                        self.publish_value(topic, value);
                    }
                }
                Ok(())
            }
            Ok(_other) => {
                tracing::warn!(%service, "item listing at `/` was not a dictionary");
                Ok(())
            }
            Err(err) if err.is_unknown_object_or_method() => {
                tracing::warn!(%service, "service does not provide an item listing, introspecting instead");
                self.introspect_service(service, device_instance, "/", publish).await;
                Ok(())
            }
            Err(err) if err.is_benign_during_scan() => {
                tracing::info!(%service, %err, "service disappeared while being scanned");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Recursively walks `path`'s introspection tree, reading and recording every leaf bus item
    /// found. Boxed because Rust has no native support for `async fn` recursion.
    pub fn introspect_service<'a>(
        &'a mut self,
        service: &'a ServiceName,
        device_instance: u32,
        path: &'a str,
        publish: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let xml = match self.object_bus.introspect(service.as_str(), path).await {
                Ok(xml) => xml,
                Err(err) => {
                    tracing::debug!(%service, %path, %err, "introspection failed");
                    return;
                }
            };

            let step = match introspect::walk(path, &xml) {
                Ok(step) => step,
                Err(err) => {
                    tracing::debug!(%service, %path, %err, "malformed introspection XML");
                    return;
                }
            };

            match step {
                introspect::IntrospectStep::Leaf => {
                    let value = match self.object_bus.get_value(service.as_str(), path).await {
                        Ok(value) => value,
                        Err(err) => {
                            tracing::debug!(%service, %path, %err, "failed to read leaf value");
                            return;
                        }
                    };
                    let outcome = self.tables.add_item(service, device_instance, path, value.clone());
                    if publish
                        && let Some(topic) = outcome.topic()
                    {
                        self.publish_value(topic, value);
                    }
                }
                introspect::IntrospectStep::Empty => {}
                introspect::IntrospectStep::Children(children) => {
                    for child in children {
                        self.introspect_service(service, device_instance, &child.0, publish).await;
                    }
                }
            }
        })
    }

    /// Reacts to a `NameOwnerChanged` signal: scans a service that just appeared, or retracts
    /// and forgets one that just vanished.
    pub async fn handle_owner_changed(&mut self, name: &str, old_owner: &str, new_owner: &str) {
        if !name.starts_with(SERVICE_PREFIX) {
            return;
        }
        let Ok(service) = ServiceName::parse(name) else {
            return;
        };

        if !new_owner.is_empty() {
            if let Err(err) = self.scan_service(&service, true).await {
                tracing::error!(%name, %err, "unexpected object-bus error scanning newly appeared service");
            }
            self.tables.record_owner(new_owner.to_string(), service);
        } else if !old_owner.is_empty() {
            tracing::info!(%name, "service disappeared");
            for topic in self.tables.remove_by_service(&service) {
                if topic != vebus_model::serial_topic(&self.system_id) {
                    self.queue.unpublish(&topic);
                }
            }
            self.tables.remove_service_entry(&service);
            self.tables.remove_owner(old_owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::registrator::LoggingRegistrator;
    use crate::test_support::{FakeBroker, FakeObjectBus};

    fn bridge(object_bus: FakeObjectBus) -> Bridge<FakeObjectBus, FakeBroker, LoggingRegistrator> {
        Bridge::new(
            SystemId::new("d0ff500097c0").unwrap(),
            Arc::new(object_bus),
            Arc::new(FakeBroker::connected()),
            LoggingRegistrator::default(),
            Some(Duration::seconds(60)),
        )
    }

    #[tokio::test]
    async fn test_initial_scan_records_bulk_item_listing() {
        let mut items = indexmap::IndexMap::new();
        items.insert("/Serial".to_string(), Value::Text("abc".to_string()));
        let object_bus = FakeObjectBus::new()
            .with_name("com.victronenergy.system", ":1.1")
            .with_value("com.victronenergy.system", "/DeviceInstance", Value::Int32(0))
            .with_value("com.victronenergy.system", "/", Value::Map(items));
        let mut bridge = bridge(object_bus);

        bridge.initial_scan().await.unwrap();

        assert_eq!(
            bridge.tables.topic_for_uid("com.victronenergy.system/Serial"),
            Some("N/d0ff500097c0/system/0/Serial")
        );
        assert_eq!(bridge.tables.service_by_owner(":1.1").map(|s| s.as_str()), Some("com.victronenergy.system"));
    }

    #[tokio::test]
    async fn test_scan_falls_back_to_introspection_without_device_instance() {
        let object_bus = FakeObjectBus::new()
            .with_introspect(
                "com.victronenergy.battery",
                "/",
                r#"<node><node name="Soc"/></node>"#,
            )
            .with_value("com.victronenergy.battery", "/Soc", Value::Double(88.0))
            .with_introspect("com.victronenergy.battery", "/Soc", r#"<node><interface name="com.victronenergy.BusItem"/></node>"#);
        let mut bridge = bridge(object_bus);

        let service = ServiceName::parse("com.victronenergy.battery").unwrap();
        bridge.scan_service(&service, false).await.unwrap();

        assert_eq!(
            bridge.tables.topic_for_uid("com.victronenergy.battery/Soc"),
            Some("N/d0ff500097c0/battery/0/Soc")
        );
    }

    #[tokio::test]
    async fn test_owner_lost_retracts_every_topic_for_that_service() {
        let mut items = indexmap::IndexMap::new();
        items.insert("/Other".to_string(), Value::Int32(1));
        let object_bus = FakeObjectBus::new()
            .with_value("com.victronenergy.settings", "/DeviceInstance", Value::Int32(0))
            .with_value("com.victronenergy.settings", "/", Value::Map(items));
        let mut bridge = bridge(object_bus);

        let service = ServiceName::parse("com.victronenergy.settings").unwrap();
        bridge.scan_service(&service, false).await.unwrap();
        bridge.tables.record_owner(":1.5".to_string(), service.clone());
        bridge.subscriptions.subscribe_all(Some(Duration::seconds(60)), Utc::now());
        let topic = bridge.tables.topic_for_uid("com.victronenergy.settings/Other").unwrap().to_string();
        bridge.publish_value(&topic, Value::Int32(1));

        bridge.handle_owner_changed("com.victronenergy.settings", ":1.5", "").await;

        assert!(bridge.tables.topic_for_uid("com.victronenergy.settings/Other").is_none());
        assert!(bridge.tables.service_by_owner(":1.5").is_none());
    }
}
