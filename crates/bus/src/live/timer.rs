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

//! Tokio-backed periodic ticks, feeding the single owning task's event channel.
//!
//! The bridge has exactly one timer shape: "every `period`, post `event` onto `sender`". The 1 s
//! queue-drain timer and the 10 s subscription-cleanup timer are both instances
//! of this with a different period and event value.

use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Spawns a task that sends `event` on `sender` every `period`, until the channel closes.
///
/// Ticks that are missed (e.g. because the owning task was busy) are delayed rather than
/// bursted, so a slow owner never sees a pile of backlogged ticks fire back to back.
pub fn spawn_interval<T>(period: Duration, event: T, sender: mpsc::UnboundedSender<T>) -> tokio::task::JoinHandle<()>
where
    T: Clone + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if sender.send(event.clone()).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tick;

    #[tokio::test(start_paused = true)]
    async fn test_spawn_interval_fires_repeatedly() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_interval(Duration::from_millis(10), Tick, tx);

        for _ in 0..3 {
            let got = rx.recv().await;
            assert_eq!(got, Some(Tick));
        }
        handle.abort();
    }

    #[tokio::test]
    async fn test_spawn_interval_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel::<Tick>();
        let handle = spawn_interval(Duration::from_millis(1), Tick, tx);
        drop(rx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should finish once the receiver is dropped")
            .unwrap();
    }
}
