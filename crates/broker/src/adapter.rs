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

//! The `rumqttc`-backed [`Broker`] implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use tokio::sync::mpsc;
use tracing::warn;

use crate::broker::{Broker, BrokerEvent, ConnectOptions};
use crate::error::BrokerError;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// A connected MQTT client plus the background task draining its event loop.
#[derive(Debug)]
pub struct RumqttcBroker {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl RumqttcBroker {
    /// Connects to the broker described by `options` and spawns the task that polls its event
    /// loop, translating incoming packets into [`BrokerEvent`]s.
    ///
    /// Returns the handle used for `publish`/`subscribe`, and the receiver the owning task reads
    /// `BrokerEvent`s from.
    pub async fn connect(options: ConnectOptions) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<BrokerEvent>)> {
        let mut mqtt_options = MqttOptions::new(options.client_id.clone(), options.host.clone(), options.port);
        mqtt_options.set_keep_alive(KEEP_ALIVE);

        if let (Some(username), Some(password)) = (&options.username, &options.password) {
            mqtt_options.set_credentials(username, password);
        }

        if let Some(ca_path) = &options.ca_file {
            let ca = std::fs::read(ca_path).map_err(|source| BrokerError::CaCertificate {
                path: ca_path.display().to_string(),
                source,
            })?;
            mqtt_options.set_transport(Transport::Tls(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: None,
            }));
        }

        let (client, mut event_loop) = AsyncClient::new(mqtt_options, EVENT_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        let connected_writer = Arc::clone(&connected);

        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        connected_writer.store(true, Ordering::SeqCst);
                        if tx.send(BrokerEvent::Connected).is_err() {
                            break;
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let event = BrokerEvent::Message {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        connected_writer.store(false, Ordering::SeqCst);
                        if tx.send(BrokerEvent::Disconnected).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%err, "broker event loop error, retrying");
                        connected_writer.store(false, Ordering::SeqCst);
                        if tx.send(BrokerEvent::Disconnected).is_err() {
                            break;
                        }
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok((Self { client, connected }, rx))
    }
}

#[async_trait::async_trait]
impl Broker for RumqttcBroker {
    async fn subscribe(&self, pattern: &str) -> Result<(), BrokerError> {
        self.client
            .subscribe(pattern, QoS::AtMostOnce)
            .await
            .map_err(|err| BrokerError::ClientSend("subscribe", err))
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), BrokerError> {
        self.client
            .publish(topic, QoS::AtMostOnce, retain, payload)
            .await
            .map_err(|err| BrokerError::ClientSend("publish", err))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        self.client
            .disconnect()
            .await
            .map_err(|err| BrokerError::ClientSend("disconnect", err))
    }
}
