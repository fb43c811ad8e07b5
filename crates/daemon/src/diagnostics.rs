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

//! A point-in-time snapshot of the bridge's internal counters, logged on `SIGUSR1` in place of a
//! thread stack dump.

use vebus_broker::Broker;
use vebus_objectbus::ObjectBus;

use crate::bridge::Bridge;
use crate::registrator::CloudRegistrator;

/// Counters useful for diagnosing a stuck or misbehaving bridge without attaching a debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub known_values: usize,
    pub published_topics: usize,
    pub pending_writes: usize,
    pub active_subscriptions: usize,
    pub connected_to_broker: bool,
    pub connected_to_cloud: bool,
}

impl<O, K, R> Bridge<O, K, R>
where
    O: ObjectBus,
    K: Broker,
    R: CloudRegistrator,
{
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            known_values: self.tables.values().count(),
            published_topics: self.queue.published_topics().count(),
            pending_writes: self.queue.pending_len(),
            active_subscriptions: self.subscriptions.len(),
            connected_to_broker: self.broker.is_connected(),
            connected_to_cloud: self.connected_to_cloud,
        }
    }

    pub fn log_diagnostics(&self) {
        let snapshot = self.diagnostics();
        tracing::info!(
            known_values = snapshot.known_values,
            published_topics = snapshot.published_topics,
            pending_writes = snapshot.pending_writes,
            active_subscriptions = snapshot.active_subscriptions,
            connected_to_broker = snapshot.connected_to_broker,
            connected_to_cloud = snapshot.connected_to_cloud,
            "diagnostics snapshot",
        );
    }
}
