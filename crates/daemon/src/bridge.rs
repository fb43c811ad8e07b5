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

//! The [`Bridge`]: the single struct that owns all bridge state — the topic/value/service/owner
//! tables, the subscription registry, and the publish queue.
//!
//! `Bridge` is generic over the object-bus and broker transports (and the cloud registrator) so
//! the discovery engine, change dispatcher, and request router can all be exercised against
//! in-memory fakes in tests, with no real D-Bus or MQTT connection.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Notify;
use vebus_bus::{PublishQueue, SubscriptionRegistry, Tables};
use vebus_broker::Broker;
use vebus_core::Value;
use vebus_model::{SystemId, serial_topic};
use vebus_objectbus::ObjectBus;

use crate::registrator::CloudRegistrator;

/// Owns every piece of mutable bridge state and the two transport handles it drives.
///
/// Nothing here is `Mutex`-guarded: a single owning task processes one [`crate::event_loop::Event`]
/// at a time and is the sole holder of `&mut Bridge` for the duration of that processing, which
/// is what makes the single-threaded-cooperative model sound without locking.
pub struct Bridge<O, K, R> {
    pub(crate) system_id: SystemId,
    pub(crate) tables: Tables,
    pub(crate) queue: PublishQueue,
    pub(crate) subscriptions: SubscriptionRegistry,
    pub(crate) keep_alive_ttl: Option<Duration>,
    pub(crate) connected_to_cloud: bool,
    pub(crate) registrator: R,
    pub(crate) object_bus: Arc<O>,
    pub(crate) broker: Arc<K>,
    pub(crate) idle: Arc<Notify>,
}

impl<O, K, R> Bridge<O, K, R>
where
    O: ObjectBus,
    K: Broker,
    R: CloudRegistrator,
{
    #[must_use]
    pub fn new(
        system_id: SystemId,
        object_bus: Arc<O>,
        broker: Arc<K>,
        registrator: R,
        keep_alive_ttl: Option<Duration>,
    ) -> Self {
        let tables = Tables::new(system_id.clone());
        Self {
            system_id,
            tables,
            queue: PublishQueue::new(),
            subscriptions: SubscriptionRegistry::new(),
            keep_alive_ttl,
            connected_to_cloud: false,
            registrator,
            object_bus,
            broker,
            idle: Arc::new(Notify::new()),
        }
    }

    #[must_use]
    pub fn system_id(&self) -> &SystemId {
        &self.system_id
    }

    /// A clone of the handle the owning task awaits to service the queue between timer ticks,
    /// once a write or read makes the queue non-empty.
    #[must_use]
    pub fn idle_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.idle)
    }

    /// A clone of the object-bus handle, for the task that forwards its event stream into the
    /// mailbox.
    #[must_use]
    pub fn object_bus_handle(&self) -> Arc<O> {
        Arc::clone(&self.object_bus)
    }

    pub(crate) fn request_idle_drain(&self) {
        self.idle.notify_one();
    }

    /// Runs the cloud registrator once, e.g. at startup when `--init-broker` is set.
    pub async fn register_with_cloud(&self) {
        self.registrator.register().await;
    }

    /// Enqueues `value` on `topic` if it is already live or newly covered by a subscription
    ///. A no-op if no subscription covers it.
    pub(crate) fn publish_value(&mut self, topic: &str, value: Value) {
        self.queue.publish_if_subscribed(topic, value, &self.subscriptions);
    }

    /// Re-publishes every known value, in sorted-topic order.
    pub(crate) fn publish_all(&mut self) {
        for (topic, value) in self.tables.topic_values_sorted() {
            self.publish_value(&topic, value);
        }
    }

    /// Runs the full connect sequence: the keepalive marker, the serial number (direct, never
    /// gated on a subscription), and a full re-publish of every known value.
    pub async fn on_connect(&mut self) -> Result<(), crate::error::BridgeError> {
        self.broker.subscribe(&format!("R/{}/#", self.system_id)).await?;
        self.broker.subscribe(&format!("W/{}/#", self.system_id)).await?;
        if let Some(client_id) = self.registrator.client_id() {
            self.broker
                .subscribe(&format!("$SYS/broker/connection/{client_id}/state"))
                .await?;
        }

        self.queue.force_publish(&format!("N/{}/keepalive", self.system_id), Value::Int32(1));
        self.queue.force_publish(
            &serial_topic(&self.system_id),
            Value::Text(self.system_id.as_str().to_string()),
        );
        self.publish_all();
        Ok(())
    }

    /// A timer tick: drains one slice of the pending queue if due, re-scheduling an idle drain
    /// if items remain.
    pub async fn run_timer_drain(&mut self) -> Result<(), crate::error::BridgeError> {
        if let Some((drained, more_remain)) = self.queue.try_timer_drain(Utc::now(), self.broker.is_connected()) {
            self.publish_drained(drained).await?;
            if more_remain {
                self.request_idle_drain();
            }
        }
        Ok(())
    }

    /// An idle-hook drain: services the queue once, with no throttle.
    pub async fn run_idle_drain(&mut self) -> Result<(), crate::error::BridgeError> {
        if let Some(drained) = self.queue.try_idle_drain(Utc::now(), self.broker.is_connected()) {
            self.publish_drained(drained).await?;
        }
        Ok(())
    }

    async fn publish_drained(&self, drained: Vec<(String, Value)>) -> Result<(), crate::error::BridgeError> {
        for (topic, value) in drained {
            self.broker.publish(&topic, value.to_payload(), true).await?;
        }
        Ok(())
    }

    /// Graceful shutdown: drains the queue exactly once, ignoring the timer throttle, then
    /// disconnects from the broker.
    pub async fn shutdown(&mut self) {
        if let Some(drained) = self.queue.try_idle_drain(Utc::now(), self.broker.is_connected())
            && let Err(err) = self.publish_drained(drained).await
        {
            tracing::warn!(%err, "failed to drain queue during shutdown");
        }
        if let Err(err) = self.broker.disconnect().await {
            tracing::warn!(%err, "failed to disconnect from broker during shutdown");
        }
    }

    /// The periodic subscription-cleanup pass: expires stale subscriptions and retracts whatever
    /// they were the only thing keeping alive. The serial topic is always exempt.
    pub fn run_cleanup(&mut self) {
        let serial = serial_topic(&self.system_id);
        let published: Vec<String> = self.queue.published_topics().map(str::to_string).collect();
        let stale = self.subscriptions.cleanup(
            published.iter().map(String::as_str),
            &[serial.as_str()],
            Utc::now(),
        );
        for topic in stale {
            tracing::debug!(%topic, "expiring topic");
            self.queue.unpublish(&topic);
        }
    }
}
