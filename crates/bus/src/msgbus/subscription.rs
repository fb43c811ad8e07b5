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

//! Subscription registry with TTL-based expiry.
//!
//! The all-wildcard entry, once present, is always kept at index 0 so [`SubscriptionRegistry::matches`]
//! can short-circuit on it without scanning the rest of the list.

use chrono::{DateTime, Duration, Utc};

use super::topic::{Pattern, ShortTopic};

/// A single subscription: a pattern, the instant it was (re-)created, and its TTL.
///
/// `ttl` of `None` means the subscription never expires (keep-alive disabled via a
/// non-positive `--keep-alive` CLI value).
#[derive(Clone, Debug)]
struct Entry {
    pattern: Pattern,
    created_at: DateTime<Utc>,
    ttl: Option<Duration>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - self.created_at > ttl,
            None => false,
        }
    }
}

/// The registry of currently active subscriptions.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<Entry>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures the all-wildcard entry is present, refreshing its timestamp and TTL.
    ///
    /// Returns `true` if the entry was newly created.
    pub fn subscribe_all(&mut self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.pattern == Pattern::AllWildcard)
        {
            entry.created_at = now;
            entry.ttl = ttl;
            false
        } else {
            self.entries.insert(
                0,
                Entry {
                    pattern: Pattern::AllWildcard,
                    created_at: now,
                    ttl,
                },
            );
            true
        }
    }

    /// Idempotent insert of `pattern`. Refreshes timestamp/TTL if already present.
    ///
    /// Returns `true` if this is a newly created subscription.
    pub fn subscribe(&mut self, pattern: &str, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        let parsed = Pattern::parse(pattern);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.pattern == parsed) {
            entry.created_at = now;
            entry.ttl = ttl;
            false
        } else {
            self.entries.push(Entry {
                pattern: parsed,
                created_at: now,
                ttl,
            });
            true
        }
    }

    /// True iff any current entry's pattern matches `short`.
    #[must_use]
    pub fn matches(&self, short: &ShortTopic) -> bool {
        self.entries.iter().any(|e| e.pattern.matches(short))
    }

    /// Removes expired entries and returns the set of published topics that must be retracted.
    ///
    /// If a non-expired all-wildcard entry remains after expiry, retraction is short-circuited
    /// to an empty set.
    pub fn cleanup<'a, I>(
        &mut self,
        published: I,
        exceptions: &[&str],
        now: DateTime<Utc>,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let had_expired = self.entries.iter().any(|e| e.is_expired(now));
        if !had_expired {
            return Vec::new();
        }

        self.entries.retain(|e| !e.is_expired(now));

        if self.entries.iter().any(|e| e.pattern == Pattern::AllWildcard) {
            return Vec::new();
        }

        published
            .into_iter()
            .filter(|topic| !exceptions.contains(topic))
            .filter(|topic| !self.matches(&super::topic::short_topic_of(topic)))
            .map(str::to_string)
            .collect()
    }

    /// Number of currently held subscriptions (surfaced in the `SIGUSR1` diagnostics dump).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn short(s: &str) -> ShortTopic {
        s.split('/').map(str::to_string).collect()
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let mut reg = SubscriptionRegistry::new();
        assert!(reg.subscribe("system/+/State", Some(Duration::seconds(60)), at(0)));
        assert!(!reg.subscribe("system/+/State", Some(Duration::seconds(60)), at(10)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_subscribe_all_kept_once() {
        let mut reg = SubscriptionRegistry::new();
        assert!(reg.subscribe_all(Some(Duration::seconds(60)), at(0)));
        assert!(!reg.subscribe_all(Some(Duration::seconds(60)), at(5)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_matches_requires_a_covering_subscription() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe("system/+/Relay/0/State", Some(Duration::seconds(60)), at(0));
        assert!(reg.matches(&short("system/0/Relay/0/State")));
        assert!(!reg.matches(&short("settings/0/Other")));
    }

    #[test]
    fn test_cleanup_retracts_only_unmatched_non_exempt_topics() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe("system/0/Serial", Some(Duration::seconds(60)), at(0));
        let published = vec!["N/s/system/0/Serial", "N/s/settings/0/Other"];
        let retract = reg.cleanup(published.into_iter(), &["N/s/system/0/Serial"], at(100));
        assert_eq!(retract, vec!["N/s/settings/0/Other".to_string()]);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_cleanup_short_circuits_when_all_wildcard_survives() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe_all(None, at(0));
        reg.subscribe("system/0/Serial", Some(Duration::seconds(60)), at(0));
        let published = vec!["N/s/system/0/Serial", "N/s/settings/0/Other"];
        let retract = reg.cleanup(published.into_iter(), &[], at(100));
        assert!(retract.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_cleanup_does_nothing_when_nothing_expired() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe("system/0/Serial", Some(Duration::seconds(60)), at(0));
        let published = vec!["N/s/settings/0/Other"];
        let retract = reg.cleanup(published.into_iter(), &[], at(10));
        assert!(retract.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_never_expiring_subscription_survives_cleanup() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe("system/0/Serial", None, at(0));
        reg.subscribe("settings/0/X", Some(Duration::seconds(5)), at(0));
        let published = vec!["N/s/settings/0/X"];
        let retract = reg.cleanup(published.into_iter(), &[], at(100));
        assert_eq!(retract, vec!["N/s/settings/0/X".to_string()]);
        assert_eq!(reg.len(), 1);
    }
}
