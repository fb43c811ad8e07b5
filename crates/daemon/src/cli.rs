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

//! Command-line flags and their environment-variable fallbacks.

use chrono::Duration;
use clap::Parser;
use vebus_broker::ConnectOptions;

/// Publishes object-bus values to a broker, and routes broker reads/writes back to the bus.
#[derive(Debug, Parser)]
#[command(name = "vebus-daemon", version, about)]
pub struct Cli {
    /// Broker host.
    #[arg(short = 'q', long = "mqtt-server", env = "BRIDGE_MQTT_SERVER", default_value = "localhost")]
    pub mqtt_server: String,

    /// Broker port. Defaults to 8883 when a CA certificate is given, 1883 otherwise.
    #[arg(long = "mqtt-port", env = "BRIDGE_MQTT_PORT")]
    pub mqtt_port: Option<u16>,

    /// Broker username.
    #[arg(short = 'u', long = "mqtt-user", env = "BRIDGE_MQTT_USER")]
    pub mqtt_user: Option<String>,

    /// Broker password.
    #[arg(short = 'P', long = "mqtt-password", env = "BRIDGE_MQTT_PASSWORD")]
    pub mqtt_password: Option<String>,

    /// Path to a CA certificate used for TLS to the broker.
    #[arg(short = 'c', long = "mqtt-certificate", env = "BRIDGE_MQTT_CA")]
    pub mqtt_certificate: Option<std::path::PathBuf>,

    /// Explicit D-Bus peer address; defaults to the session bus (if `DBUS_SESSION_BUS_ADDRESS`
    /// is set) or the system bus otherwise.
    #[arg(short = 'b', long = "dbus-address", env = "BRIDGE_DBUS_ADDRESS")]
    pub dbus_address: Option<String>,

    /// Overrides the system id normally read from `com.victronenergy.system`'s `/Serial`
    /// property at startup. Mainly useful for running against a bus with no system service yet.
    #[arg(long = "system-id", env = "BRIDGE_SYSTEM_ID")]
    pub system_id: Option<String>,

    /// Keep-alive TTL in seconds for broker subscriptions. A value `<= 0` disables expiry.
    #[arg(short = 'k', long = "keep-alive", env = "BRIDGE_KEEP_ALIVE", default_value_t = 60)]
    pub keep_alive: i64,

    /// Register this bridge's credentials with the cloud broker at startup.
    #[arg(short = 'i', long = "init-broker", env = "BRIDGE_INIT_BROKER")]
    pub init_broker: bool,

    /// Raise log verbosity to debug.
    #[arg(short = 'd', long = "debug", env = "BRIDGE_DEBUG")]
    pub debug: bool,
}

impl Cli {
    /// The keep-alive TTL as a [`Duration`], or `None` if keep-alive expiry is disabled
    /// (a non-positive value disables it).
    #[must_use]
    pub fn keep_alive_ttl(&self) -> Option<Duration> {
        if self.keep_alive <= 0 {
            None
        } else {
            Some(Duration::seconds(self.keep_alive))
        }
    }

    /// The broker port, applying the CA-dependent default.
    #[must_use]
    pub fn resolved_mqtt_port(&self) -> u16 {
        self.mqtt_port.unwrap_or(if self.mqtt_certificate.is_some() { 8883 } else { 1883 })
    }

    /// Builds the [`ConnectOptions`] the broker adapter connects with.
    #[must_use]
    pub fn broker_connect_options(&self, client_id: String) -> ConnectOptions {
        ConnectOptions {
            host: self.mqtt_server.clone(),
            port: self.resolved_mqtt_port(),
            ca_file: self.mqtt_certificate.clone(),
            username: self.mqtt_user.clone(),
            password: self.mqtt_password.clone(),
            client_id,
        }
    }
}
