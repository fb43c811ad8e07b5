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

//! The publish queue: which topics are currently live, and what is pending a write to the broker
//!.
//!
//! `published` (`P` in the reference) is the set of topics this bridge currently owns on the
//! broker. `pending` is a separate, insertion-ordered mapping of topic to its latest value,
//! collapsing repeated updates to a single write per drain. [`Value::Null`] in `pending` signals
//! a retraction, which the broker adapter must translate into an empty payload rather than the
//! JSON `{"value":null}` envelope.

use std::collections::HashSet;

use ahash::RandomState;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use vebus_core::Value;

use super::subscription::SubscriptionRegistry;
use super::topic::short_topic_of;

/// Maximum number of entries written to the broker in a single drain.
pub const DRAIN_SLICE: usize = 50;

/// Minimum time between timer-driven drains.
#[must_use]
pub fn drain_throttle() -> Duration {
    Duration::milliseconds(1500)
}

/// Tracks published topics and the pending writes destined for the broker.
#[derive(Debug, Default)]
pub struct PublishQueue {
    published: HashSet<String, RandomState>,
    pending: IndexMap<String, Value>,
    last_drain: Option<DateTime<Utc>>,
}

impl PublishQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_published(&self, topic: &str) -> bool {
        self.published.contains(topic)
    }

    /// All topics currently live on the broker, for the periodic cleanup pass.
    pub fn published_topics(&self) -> impl Iterator<Item = &str> {
        self.published.iter().map(String::as_str)
    }

    /// Publishes `value` on `topic` if it is already live, or if `subscriptions` covers its short
    /// form. Returns `true` if the write was accepted into the pending queue.
    pub fn publish_if_subscribed(
        &mut self,
        topic: &str,
        value: Value,
        subscriptions: &SubscriptionRegistry,
    ) -> bool {
        if self.published.contains(topic) {
            self.enqueue(topic, value);
            return true;
        }
        if subscriptions.matches(&short_topic_of(topic)) {
            self.published.insert(topic.to_string());
            self.enqueue(topic, value);
            return true;
        }
        false
    }

    /// Removes `topic` from the published set and enqueues a retraction.
    pub fn unpublish(&mut self, topic: &str) {
        self.published.remove(topic);
        self.enqueue(topic, Value::Null);
    }

    /// Enqueues `value` on `topic` unconditionally, bypassing the published-set check.
    ///
    /// Used for the system serial-number topic, which is written directly on connect and on the
    /// first legacy subscribe-all request rather than going through the normal publish gate.
    pub fn force_publish(&mut self, topic: &str, value: Value) {
        self.enqueue(topic, value);
    }

    fn enqueue(&mut self, topic: &str, value: Value) {
        self.pending.insert(topic.to_string(), value);
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn drain_slice(&mut self, max: usize) -> Vec<(String, Value)> {
        let keys: Vec<String> = self.pending.keys().take(max).cloned().collect();
        keys.into_iter()
            .map(|k| {
                let v = self.pending.shift_remove(&k).expect("key just read from the map");
                (k, v)
            })
            .collect()
    }

    /// A timer tick: drains one slice if the queue is non-empty, the
    /// broker is connected, and at least [`drain_throttle`] has elapsed since the last drain.
    ///
    /// Returns the drained entries, and whether the queue still has items left over (in which
    /// case the caller should schedule an immediate idle drain).
    pub fn try_timer_drain(
        &mut self,
        now: DateTime<Utc>,
        connected: bool,
    ) -> Option<(Vec<(String, Value)>, bool)> {
        if !connected || self.pending.is_empty() {
            return None;
        }
        if let Some(last) = self.last_drain
            && now - last < drain_throttle()
        {
            return None;
        }
        let drained = self.drain_slice(DRAIN_SLICE);
        self.last_drain = Some(now);
        let more_remain = !self.pending.is_empty();
        Some((drained, more_remain))
    }

    /// An idle-hook drain: one slice, gated only on connectivity and non-emptiness,
    /// with no throttle.
    pub fn try_idle_drain(&mut self, now: DateTime<Utc>, connected: bool) -> Option<Vec<(String, Value)>> {
        if !connected || self.pending.is_empty() {
            return None;
        }
        let drained = self.drain_slice(DRAIN_SLICE);
        self.last_drain = Some(now);
        Some(drained)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_publish_requires_existing_or_matching_subscription() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe("system/0/Serial", Some(Duration::seconds(60)), at(0));

        assert!(q.publish_if_subscribed(
            "N/s/system/0/Serial",
            Value::Text("abc".into()),
            &subs
        ));
        assert!(q.is_published("N/s/system/0/Serial"));

        assert!(!q.publish_if_subscribed("N/s/settings/0/Other", Value::Int32(1), &subs));
        assert!(!q.is_published("N/s/settings/0/Other"));
    }

    #[test]
    fn test_repeated_updates_collapse_to_latest() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe_all(None, at(0));

        q.publish_if_subscribed("N/s/a/0/X", Value::Int32(1), &subs);
        q.publish_if_subscribed("N/s/a/0/X", Value::Int32(2), &subs);
        assert_eq!(q.pending_len(), 1);

        let (drained, more) = q.try_timer_drain(at(10), true).unwrap();
        assert!(!more);
        assert_eq!(drained, vec![("N/s/a/0/X".to_string(), Value::Int32(2))]);
    }

    #[test]
    fn test_unpublish_enqueues_null() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe_all(None, at(0));
        q.publish_if_subscribed("N/s/a/0/X", Value::Int32(1), &subs);
        q.unpublish("N/s/a/0/X");

        assert!(!q.is_published("N/s/a/0/X"));
        let (drained, _) = q.try_timer_drain(at(10), true).unwrap();
        assert_eq!(drained, vec![("N/s/a/0/X".to_string(), Value::Null)]);
    }

    #[test]
    fn test_timer_drain_is_throttled() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe_all(None, at(0));
        q.publish_if_subscribed("N/s/a/0/X", Value::Int32(1), &subs);

        assert!(q.try_timer_drain(at(0), true).is_some());
        q.publish_if_subscribed("N/s/a/0/Y", Value::Int32(2), &subs);
        assert!(q.try_timer_drain(at(1), true).is_none());
        assert!(q.try_timer_drain(at(2), true).is_some());
    }

    #[test]
    fn test_drain_skipped_when_disconnected() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe_all(None, at(0));
        q.publish_if_subscribed("N/s/a/0/X", Value::Int32(1), &subs);
        assert!(q.try_timer_drain(at(0), false).is_none());
        assert!(q.try_idle_drain(at(0), false).is_none());
    }

    #[test]
    fn test_published_topics_reflects_live_set() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe_all(None, at(0));
        q.publish_if_subscribed("N/s/a/0/X", Value::Int32(1), &subs);
        let mut published: Vec<&str> = q.published_topics().collect();
        published.sort_unstable();
        assert_eq!(published, vec!["N/s/a/0/X"]);

        q.unpublish("N/s/a/0/X");
        assert_eq!(q.published_topics().count(), 0);
    }

    #[test]
    fn test_force_publish_bypasses_published_set() {
        let mut q = PublishQueue::new();
        q.force_publish("N/s/system/0/Serial", Value::Text("abc".into()));
        assert!(!q.is_published("N/s/system/0/Serial"));
        let (drained, _) = q.try_timer_drain(at(0), true).unwrap();
        assert_eq!(drained, vec![("N/s/system/0/Serial".to_string(), Value::Text("abc".into()))]);
    }

    #[test]
    fn test_slice_cap_leaves_remainder_for_idle_drain() {
        let mut q = PublishQueue::new();
        let mut subs = SubscriptionRegistry::new();
        subs.subscribe_all(None, at(0));
        for i in 0..(DRAIN_SLICE + 5) {
            q.publish_if_subscribed(&format!("N/s/a/0/{i}"), Value::Int32(i as i32), &subs);
        }
        let (drained, more) = q.try_timer_drain(at(0), true).unwrap();
        assert_eq!(drained.len(), DRAIN_SLICE);
        assert!(more);

        let rest = q.try_idle_drain(at(0), true).unwrap();
        assert_eq!(rest.len(), 5);
        assert!(q.is_empty());
    }
}
