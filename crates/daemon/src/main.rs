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

use std::sync::Arc;

use clap::Parser;
use vebus_broker::RumqttcBroker;
use vebus_daemon::{Bridge, Cli, LoggingRegistrator};
use vebus_daemon::discovery::resolve_system_id;
use vebus_objectbus::ZbusObjectBus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    vebus_bus::logging::init(cli.debug)?;

    let object_bus = Arc::new(ZbusObjectBus::connect(cli.dbus_address.as_deref()).await?);

    let system_id = resolve_system_id(object_bus.as_ref(), cli.system_id.clone()).await?;
    tracing::info!(%system_id, "resolved system id");

    let registrator = LoggingRegistrator::new(None);
    let client_id = format!("vebus-bridge-{system_id}");
    let (broker, broker_events) = RumqttcBroker::connect(cli.broker_connect_options(client_id)).await?;
    let broker = Arc::new(broker);

    let mut bridge = Bridge::new(system_id, Arc::clone(&object_bus), broker, registrator, cli.keep_alive_ttl());

    bridge.initial_scan().await?;

    if cli.init_broker {
        bridge.register_with_cloud().await;
    }

    vebus_daemon::event_loop::run(&mut bridge, broker_events).await
}
