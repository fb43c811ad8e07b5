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

//! The owning task: a single mailbox fed by the object-bus event stream, the broker event
//! channel, two periodic timers, the idle-drain notification, and OS signals, processed one at a
//! time so nothing here ever needs a lock.

use futures::StreamExt;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::time::Duration;
use vebus_bus::live::timer::spawn_interval;
use vebus_broker::{Broker, BrokerEvent};
use vebus_objectbus::{ObjectBus, ObjectBusEvent};

use crate::bridge::Bridge;
use crate::registrator::CloudRegistrator;

const TIMER_DRAIN_PERIOD: Duration = Duration::from_secs(1);
const CLEANUP_PERIOD: Duration = Duration::from_secs(10);

/// Everything the owning task reacts to, collapsed into a single enum so one `mpsc` channel can
/// carry all of it.
#[derive(Debug, Clone)]
enum Event {
    Bus(ObjectBusEvent),
    Broker(BrokerEvent),
    TimerDrain,
    Cleanup,
    Idle,
    Diagnostics,
    Shutdown,
}

/// Runs the bridge until a shutdown signal arrives.
///
/// `broker_events` is the receiver returned alongside the broker adapter's `connect`; it is owned
/// by this function for the lifetime of the run.
pub async fn run<O, K, R>(
    bridge: &mut Bridge<O, K, R>,
    broker_events: mpsc::UnboundedReceiver<BrokerEvent>,
) -> anyhow::Result<()>
where
    O: ObjectBus + 'static,
    K: Broker + 'static,
    R: CloudRegistrator + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    spawn_bus_forwarder(bridge, tx.clone());
    spawn_broker_forwarder(broker_events, tx.clone());
    spawn_idle_forwarder(bridge, tx.clone());
    spawn_signal_forwarder(tx.clone())?;
    spawn_interval(TIMER_DRAIN_PERIOD, Event::TimerDrain, tx.clone());
    spawn_interval(CLEANUP_PERIOD, Event::Cleanup, tx.clone());
    drop(tx);

    while let Some(event) = rx.recv().await {
        match event {
            Event::Bus(ev) => bridge.handle_bus_event(ev).await,
            Event::Broker(BrokerEvent::Connected) => {
                if let Err(err) = bridge.on_connect().await {
                    tracing::warn!(%err, "failed to run connect sequence");
                }
            }
            Event::Broker(BrokerEvent::Disconnected) => {
                tracing::warn!("disconnected from broker");
            }
            Event::Broker(BrokerEvent::Message { topic, payload }) => {
                if let Err(err) = bridge.handle_broker_message(&topic, &payload).await {
                    tracing::error!(%topic, %err, "error handling request");
                }
            }
            Event::TimerDrain => {
                if let Err(err) = bridge.run_timer_drain().await {
                    tracing::warn!(%err, "timer-driven queue drain failed");
                }
            }
            Event::Idle => {
                if let Err(err) = bridge.run_idle_drain().await {
                    tracing::warn!(%err, "idle queue drain failed");
                }
            }
            Event::Cleanup => bridge.run_cleanup(),
            Event::Diagnostics => bridge.log_diagnostics(),
            Event::Shutdown => {
                bridge.shutdown().await;
                break;
            }
        }
    }

    Ok(())
}

fn spawn_bus_forwarder<O, K, R>(bridge: &Bridge<O, K, R>, tx: mpsc::UnboundedSender<Event>)
where
    O: ObjectBus + 'static,
    K: Broker,
    R: CloudRegistrator,
{
    let object_bus = bridge.object_bus_handle();
    tokio::spawn(async move {
        let mut events = object_bus.events();
        while let Some(event) = events.next().await {
            if tx.send(Event::Bus(event)).is_err() {
                break;
            }
        }
    });
}

fn spawn_broker_forwarder(mut broker_events: mpsc::UnboundedReceiver<BrokerEvent>, tx: mpsc::UnboundedSender<Event>) {
    tokio::spawn(async move {
        while let Some(event) = broker_events.recv().await {
            if tx.send(Event::Broker(event)).is_err() {
                break;
            }
        }
    });
}

fn spawn_idle_forwarder<O, K, R>(bridge: &Bridge<O, K, R>, tx: mpsc::UnboundedSender<Event>)
where
    O: ObjectBus,
    K: Broker,
    R: CloudRegistrator,
{
    let idle = bridge.idle_handle();
    tokio::spawn(async move {
        loop {
            idle.notified().await;
            if tx.send(Event::Idle).is_err() {
                break;
            }
        }
    });
}

fn spawn_signal_forwarder(tx: mpsc::UnboundedSender<Event>) -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT, shutting down");
                    let _ = tx.send(Event::Shutdown);
                    break;
                }
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM, shutting down");
                    let _ = tx.send(Event::Shutdown);
                    break;
                }
                signal = sigusr1.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    if tx.send(Event::Diagnostics).is_err() {
                        break;
                    }
                }
            }
        }
    });
    Ok(())
}
