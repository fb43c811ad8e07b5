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

//! Turns an object-bus change signal into a value-table update and, where it is covered by a
//! subscription, a queued publish.

use indexmap::IndexMap;
use vebus_broker::Broker;
use vebus_core::Value;
use vebus_model::{ServiceName, make_uid, normalize_path};
use vebus_objectbus::{ObjectBus, ObjectBusEvent};

use crate::bridge::Bridge;
use crate::registrator::CloudRegistrator;

impl<O, K, R> Bridge<O, K, R>
where
    O: ObjectBus,
    K: Broker,
    R: CloudRegistrator,
{
    /// Routes one [`ObjectBusEvent`] to the right handler.
    pub async fn handle_bus_event(&mut self, event: ObjectBusEvent) {
        match event {
            ObjectBusEvent::PropertyChanged { service_id, path, value } => {
                self.apply_value_change(&service_id, &path, value);
            }
            ObjectBusEvent::ItemsChanged { service_id, items } => {
                self.apply_items_change(&service_id, items);
            }
            ObjectBusEvent::NameOwnerChanged { name, old_owner, new_owner } => {
                self.handle_owner_changed(&name, &old_owner, &new_owner).await;
            }
        }
    }

    fn apply_items_change(&mut self, service_id: &str, items: IndexMap<String, Value>) {
        let Some(service) = self.tables.service_by_owner(service_id).cloned() else {
            return;
        };
        for (path, value) in items {
            self.apply_value_change_for(&service, &path, value);
        }
    }

    fn apply_value_change(&mut self, service_id: &str, path: &str, value: Value) {
        let Some(service) = self.tables.service_by_owner(service_id).cloned() else {
            return;
        };
        self.apply_value_change_for(&service, path, value);
    }

    /// Records `value` at `path` on `service`, lazily registering the item if this is the first
    /// time it has been seen.
    fn apply_value_change_for(&mut self, service: &ServiceName, path: &str, value: Value) {
        let uid = make_uid(service, &normalize_path(path));
        let topic = if let Some(topic) = self.tables.topic_for_uid(&uid) {
            topic.to_string()
        } else {
            let Some(device_instance) = self.tables.device_instance_for_service(service) else {
                return;
            };
            let outcome = self.tables.add_item(service, device_instance, path, value.clone());
            let Some(topic) = outcome.topic() else {
                return;
            };
            tracing::info!(%service, %path, "new item found");
            topic.to_string()
        };

        self.tables.set_value(&uid, value.clone());
        self.publish_value(&topic, value);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use vebus_model::SystemId;

    use super::*;
    use crate::registrator::LoggingRegistrator;
    use crate::test_support::{FakeBroker, FakeObjectBus};

    fn bridge() -> Bridge<FakeObjectBus, FakeBroker, LoggingRegistrator> {
        Bridge::new(
            SystemId::new("d0ff500097c0").unwrap(),
            Arc::new(FakeObjectBus::new()),
            Arc::new(FakeBroker::connected()),
            LoggingRegistrator::default(),
            Some(Duration::seconds(60)),
        )
    }

    #[tokio::test]
    async fn test_signal_from_unknown_owner_is_ignored() {
        let mut bridge = bridge();
        bridge
            .handle_bus_event(ObjectBusEvent::PropertyChanged {
                service_id: ":1.99".to_string(),
                path: "/Relay/0/State".to_string(),
                value: Value::Int32(1),
            })
            .await;
        assert_eq!(bridge.tables.values().count(), 0);
    }

    #[tokio::test]
    async fn test_property_changed_lazily_registers_and_publishes_when_subscribed() {
        let mut bridge = bridge();
        let service = ServiceName::parse("com.victronenergy.system").unwrap();
        bridge.tables.register_service(service.short_name(0), service.clone());
        bridge.tables.record_owner(":1.1".to_string(), service.clone());
        bridge.subscriptions.subscribe("system/+/Relay/0/State", Some(Duration::seconds(60)), Utc::now());

        bridge
            .handle_bus_event(ObjectBusEvent::PropertyChanged {
                service_id: ":1.1".to_string(),
                path: "/Relay/0/State".to_string(),
                value: Value::Int32(1),
            })
            .await;

        assert_eq!(
            bridge.tables.topic_for_uid("com.victronenergy.system/Relay/0/State"),
            Some("N/d0ff500097c0/system/0/Relay/0/State")
        );
        assert!(bridge.queue.is_published("N/d0ff500097c0/system/0/Relay/0/State"));
    }

    #[tokio::test]
    async fn test_items_changed_applies_every_path_in_the_bulk_map() {
        let mut bridge = bridge();
        let service = ServiceName::parse("com.victronenergy.system").unwrap();
        bridge.tables.register_service(service.short_name(0), service.clone());
        bridge.tables.record_owner(":1.1".to_string(), service.clone());
        bridge.subscriptions.subscribe_all(None, Utc::now());

        let mut items = IndexMap::new();
        items.insert("/Ac/L1/Power".to_string(), Value::Double(230.0));
        items.insert("/Ac/L2/Power".to_string(), Value::Double(231.0));
        bridge
            .handle_bus_event(ObjectBusEvent::ItemsChanged { service_id: ":1.1".to_string(), items })
            .await;

        assert!(bridge.tables.topic_for_uid("com.victronenergy.system/Ac/L1/Power").is_some());
        assert!(bridge.tables.topic_for_uid("com.victronenergy.system/Ac/L2/Power").is_some());
    }
}
