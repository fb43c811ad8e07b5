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

//! The [`Broker`] trait: the request router and publish path are written against this rather
//! than against `rumqttc` directly.

use async_trait::async_trait;

use crate::error::BrokerError;

/// Connection parameters for [`crate::adapter::RumqttcBroker::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub ca_file: Option<std::path::PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
}

/// Connection-lifecycle and inbound-message notifications from the broker event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected,
    Disconnected,
    Message { topic: String, payload: Vec<u8> },
}

/// Transport-level operations against the broker.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Subscribes to `pattern` at QoS 0, matching the reference bridge's subscriptions.
    async fn subscribe(&self, pattern: &str) -> Result<(), BrokerError>;

    /// Publishes `payload` on `topic`. An empty payload is a retraction.
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), BrokerError>;

    /// True once the adapter has observed a `ConnAck` and no subsequent disconnect.
    fn is_connected(&self) -> bool;

    /// Disconnects from the broker. Called once, during graceful shutdown.
    async fn disconnect(&self) -> Result<(), BrokerError>;
}
