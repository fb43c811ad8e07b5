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

//! Routes broker messages back onto the object bus: reads, writes, the legacy serial-number
//! subscribe-all, the keepalive subscription batch, and the cloud connection-state meta topic.

use chrono::Utc;
use vebus_broker::Broker;
use vebus_core::{Value, ValueEnvelope};
use vebus_model::{ServiceName, normalize_path, serial_topic};
use vebus_objectbus::ObjectBus;

use crate::bridge::Bridge;
use crate::error::BridgeError;
use crate::registrator::CloudRegistrator;

const META_PREFIX: &str = "$SYS/broker/connection/";

impl<O, K, R> Bridge<O, K, R>
where
    O: ObjectBus,
    K: Broker,
    R: CloudRegistrator,
{
    /// Entry point for every incoming broker message, dispatching on its topic prefix.
    pub async fn handle_broker_message(&mut self, topic: &str, payload: &[u8]) -> Result<(), BridgeError> {
        if let Some(rest) = topic.strip_prefix(META_PREFIX) {
            self.handle_meta(rest, payload).await;
            return Ok(());
        }

        let mut parts = topic.splitn(3, '/');
        let (Some(action), Some(system_id), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(BridgeError::InvalidRequest(topic.to_string()));
        };
        if system_id != self.system_id.as_str() {
            return Err(BridgeError::InvalidRequest(format!("unknown system id: {system_id}")));
        }

        let item_topic = format!("N/{system_id}/{rest}");
        match action {
            "W" => self.handle_write(&item_topic, payload).await,
            "R" if rest == "system/0/Serial" => {
                self.handle_serial_read(&item_topic);
                Ok(())
            }
            "R" if rest == "keepalive" => {
                self.handle_keepalive(payload);
                Ok(())
            }
            "R" => self.handle_read(&item_topic).await,
            _ => Err(BridgeError::InvalidRequest(topic.to_string())),
        }
    }

    async fn handle_write(&mut self, topic: &str, payload: &[u8]) -> Result<(), BridgeError> {
        let envelope: ValueEnvelope = serde_json::from_slice(payload)
            .map_err(|err| BridgeError::InvalidRequest(format!("malformed write payload: {err}")))?;
        let (service, _device_instance, path) = self.resolve_item_topic(topic)?;

        self.object_bus
            .set_value(service.as_str(), &normalize_path(&path), envelope.value)
            .await?;
        self.request_idle_drain();
        Ok(())
    }

    async fn handle_read(&mut self, topic: &str) -> Result<(), BridgeError> {
        let (service, device_instance, path) = self.resolve_item_topic(topic)?;

        let value = self.object_bus.get_value(service.as_str(), &normalize_path(&path)).await?;
        let outcome = self.tables.add_item(&service, device_instance, &path, value.clone());
        if outcome.topic() == Some(topic) {
            self.broker.publish(topic, value.to_payload(), false).await?;
        }
        Ok(())
    }

    /// A request for the serial-number topic is treated as the legacy subscribe-all.
    fn handle_serial_read(&mut self, topic: &str) {
        if self.subscriptions.subscribe_all(self.keep_alive_ttl, Utc::now()) {
            self.queue.force_publish(topic, Value::Text(self.system_id.as_str().to_string()));
            self.publish_all();
        }
    }

    /// An empty payload re-subscribes to everything; otherwise the payload is a JSON array of
    /// topic patterns to add.
    fn handle_keepalive(&mut self, payload: &[u8]) {
        if payload.is_empty() {
            if self.subscriptions.subscribe_all(self.keep_alive_ttl, Utc::now()) {
                self.publish_all();
            }
            return;
        }

        let Ok(patterns) = serde_json::from_slice::<Vec<String>>(payload) else {
            tracing::warn!("malformed keepalive payload");
            return;
        };
        for pattern in patterns {
            if self.subscriptions.subscribe(&pattern, self.keep_alive_ttl, Utc::now()) {
                self.publish_all();
            }
        }
    }

    async fn handle_meta(&mut self, client_state_topic: &str, payload: &[u8]) {
        let Some(client_id) = self.registrator.client_id() else {
            return;
        };
        if client_state_topic != format!("{client_id}/state") {
            return;
        }

        let connected = std::str::from_utf8(payload).ok().and_then(|s| s.trim().parse::<i32>().ok()) == Some(1);
        if connected {
            tracing::info!("connected to cloud broker");
            self.connected_to_cloud = true;
        } else if self.connected_to_cloud {
            tracing::error!("lost connection with cloud broker");
            self.connected_to_cloud = false;
            self.registrator.register().await;
        }
    }

    fn resolve_item_topic(&self, topic: &str) -> Result<(ServiceName, u32, String), BridgeError> {
        let (service_type, device_instance, path) =
            parse_item_topic(topic).ok_or_else(|| BridgeError::InvalidRequest(topic.to_string()))?;
        let short_name = format!("{service_type}/{device_instance}");
        let service = self
            .tables
            .service_by_short_name(&short_name)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownService(topic.to_string()))?;
        Ok((service, device_instance, path))
    }
}

/// Splits an `N/<system-id>/<service-type>/<device-instance>/<path>` topic into its
/// `(service_type, device_instance, path)` parts.
fn parse_item_topic(topic: &str) -> Option<(String, u32, String)> {
    let mut parts = topic.splitn(5, '/');
    let _action = parts.next()?;
    let _system_id = parts.next()?;
    let service_type = parts.next()?.to_string();
    let device_instance: u32 = parts.next()?.parse().ok()?;
    let path = parts.next()?.to_string();
    Some((service_type, device_instance, path))
}
