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

//! The bridge's core tables: topic table, value table, service directory, and owner directory
//!.
//!
//! [`Tables::add_item`] is the sole writer of the topic and value tables, which concentrates the
//! UID-to-topic injectivity invariant in one place rather than scattering it across callers.

use std::collections::HashMap;

use ahash::RandomState;
use vebus_core::Value;
use vebus_model::{DeviceInstance, ServiceName, full_topic, is_blocked, make_uid, normalize_path};

type AMap<K, V> = HashMap<K, V, RandomState>;

/// Outcome of [`Tables::add_item`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddItemOutcome {
    /// The `(service-type, path)` pair is on the fixed block list; nothing was inserted.
    Blocked,
    /// The UID was already mapped; this is the topic it already maps to.
    Existing(String),
    /// A new UID/topic mapping was inserted; this is the new full topic.
    Created(String),
}

impl AddItemOutcome {
    /// The full topic regardless of whether it already existed, or `None` if blocked.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Blocked => None,
            Self::Existing(t) | Self::Created(t) => Some(t),
        }
    }

    #[must_use]
    pub fn is_newly_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// UID ↔ full-topic bijection, value storage, and the two short-name directories.
#[derive(Debug)]
pub struct Tables {
    system_id: vebus_model::SystemId,
    topics: AMap<String, String>,
    topics_rev: AMap<String, String>,
    values: AMap<String, Value>,
    services: AMap<String, ServiceName>,
    owners: AMap<String, ServiceName>,
}

impl Tables {
    #[must_use]
    pub fn new(system_id: vebus_model::SystemId) -> Self {
        Self {
            system_id,
            topics: AMap::default(),
            topics_rev: AMap::default(),
            values: AMap::default(),
            services: AMap::default(),
            owners: AMap::default(),
        }
    }

    #[must_use]
    pub fn system_id(&self) -> &vebus_model::SystemId {
        &self.system_id
    }

    /// Inserts `(service, device_instance, path, value)`, or returns the existing topic if the
    /// UID is already mapped.
    pub fn add_item(
        &mut self,
        service: &ServiceName,
        device_instance: DeviceInstance,
        path: &str,
        value: Value,
    ) -> AddItemOutcome {
        let path = normalize_path(path);
        if is_blocked(service.service_type(), &path) {
            return AddItemOutcome::Blocked;
        }

        let uid = make_uid(service, &path);
        if let Some(existing) = self.topics.get(&uid) {
            return AddItemOutcome::Existing(existing.clone());
        }

        let topic = full_topic(&self.system_id, service.service_type(), device_instance, &path);
        self.topics.insert(uid.clone(), topic.clone());
        self.topics_rev.insert(topic.clone(), uid.clone());
        self.values.insert(uid, value);
        AddItemOutcome::Created(topic)
    }

    #[must_use]
    pub fn topic_for_uid(&self, uid: &str) -> Option<&str> {
        self.topics.get(uid).map(String::as_str)
    }

    #[must_use]
    pub fn uid_for_topic(&self, topic: &str) -> Option<&str> {
        self.topics_rev.get(topic).map(String::as_str)
    }

    #[must_use]
    pub fn value(&self, uid: &str) -> Option<&Value> {
        self.values.get(uid)
    }

    /// Overwrites the stored value for an already-known UID.
    pub fn set_value(&mut self, uid: &str, value: Value) {
        self.values.insert(uid.to_string(), value);
    }

    /// All `(uid, value)` pairs, for bulk re-publish on keepalive / subscribe-all refresh.
    pub fn values(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn register_service(&mut self, short_name: String, service: ServiceName) {
        self.services.insert(short_name, service);
    }

    #[must_use]
    pub fn service_by_short_name(&self, short_name: &str) -> Option<&ServiceName> {
        self.services.get(short_name)
    }

    pub fn remove_service(&mut self, short_name: &str) -> Option<ServiceName> {
        self.services.remove(short_name)
    }

    /// Finds the device instance already registered for `service` by scanning the short-name
    /// directory.
    #[must_use]
    pub fn device_instance_for_service(&self, service: &ServiceName) -> Option<DeviceInstance> {
        self.services.iter().find_map(|(short_name, s)| {
            if s == service {
                short_name.rsplit('/').next()?.parse().ok()
            } else {
                None
            }
        })
    }

    /// Removes whichever short-name entry currently maps to `service`.
    pub fn remove_service_entry(&mut self, service: &ServiceName) -> Option<String> {
        let short_name = self
            .services
            .iter()
            .find(|(_, s)| *s == service)
            .map(|(short_name, _)| short_name.clone())?;
        self.services.remove(&short_name);
        Some(short_name)
    }

    /// All `(topic, value)` pairs in sorted-topic order, for re-publishing every known value.
    #[must_use]
    pub fn topic_values_sorted(&self) -> Vec<(String, Value)> {
        let mut pairs: Vec<(String, Value)> = self
            .values
            .iter()
            .filter_map(|(uid, value)| self.topics.get(uid).map(|topic| (topic.clone(), value.clone())))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    pub fn record_owner(&mut self, owner_id: String, service: ServiceName) {
        self.owners.insert(owner_id, service);
    }

    #[must_use]
    pub fn service_by_owner(&self, owner_id: &str) -> Option<&ServiceName> {
        self.owners.get(owner_id)
    }

    pub fn remove_owner(&mut self, owner_id: &str) -> Option<ServiceName> {
        self.owners.remove(owner_id)
    }

    /// Removes every UID prefixed by `service`'s name from the topic and value tables, returning
    /// the full topics that were removed.
    ///
    /// The caller is responsible for excluding the system serial-number topic from whatever
    /// retraction it issues from this result; that topic's UID is removed here like any other,
    /// but it must never be retracted on the wire.
    pub fn remove_by_service(&mut self, service: &ServiceName) -> Vec<String> {
        let prefix = service.as_str();
        let stale: Vec<String> = self
            .topics
            .keys()
            .filter(|uid| uid.starts_with(prefix))
            .cloned()
            .collect();

        let mut removed_topics = Vec::with_capacity(stale.len());
        for uid in stale {
            self.values.remove(&uid);
            if let Some(topic) = self.topics.remove(&uid) {
                self.topics_rev.remove(&topic);
                removed_topics.push(topic);
            }
        }
        removed_topics
    }
}

#[cfg(test)]
mod tests {
    use vebus_model::SystemId;

    use super::*;

    fn tables() -> Tables {
        Tables::new(SystemId::new("d0ff500097c0").unwrap())
    }

    fn service(name: &str) -> ServiceName {
        ServiceName::parse(name).unwrap()
    }

    #[test]
    fn test_add_item_creates_then_returns_existing() {
        let mut t = tables();
        let svc = service("com.victronenergy.system");
        let first = t.add_item(&svc, 0, "Serial", Value::Text("abc".into()));
        assert!(first.is_newly_created());
        assert_eq!(first.topic(), Some("N/d0ff500097c0/system/0/Serial"));

        let second = t.add_item(&svc, 0, "Serial", Value::Text("abc".into()));
        assert!(!second.is_newly_created());
        assert_eq!(second.topic(), first.topic());
    }

    #[test]
    fn test_add_item_rejects_blocked_pairs() {
        let mut t = tables();
        let svc = service("com.victronenergy.vebus");
        let outcome = t.add_item(&svc, 0, "/Interfaces/Mk2/Tunnel", Value::Null);
        assert_eq!(outcome, AddItemOutcome::Blocked);
        assert!(t.topic_for_uid("com.victronenergy.vebus/Interfaces/Mk2/Tunnel").is_none());
    }

    #[test]
    fn test_uid_and_topic_are_reversible() {
        let mut t = tables();
        let svc = service("com.victronenergy.battery");
        let outcome = t.add_item(&svc, 1, "Soc", Value::Double(88.0));
        let topic = outcome.topic().unwrap().to_string();
        let uid = t.uid_for_topic(&topic).unwrap().to_string();
        assert_eq!(t.topic_for_uid(&uid), Some(topic.as_str()));
    }

    #[test]
    fn test_remove_by_service_clears_only_its_own_uids() {
        let mut t = tables();
        let battery = service("com.victronenergy.battery");
        let system = service("com.victronenergy.system");
        t.add_item(&battery, 1, "Soc", Value::Double(88.0));
        t.add_item(&system, 0, "Serial", Value::Text("abc".into()));

        let removed = t.remove_by_service(&battery);
        assert_eq!(removed, vec!["N/d0ff500097c0/battery/1/Soc".to_string()]);
        assert!(t.topic_for_uid("com.victronenergy.battery/Soc").is_none());
        assert!(t.topic_for_uid("com.victronenergy.system/Serial").is_some());
    }

    #[test]
    fn test_device_instance_for_service_scans_short_names() {
        let mut t = tables();
        let svc = service("com.victronenergy.battery");
        t.register_service("battery/2".to_string(), svc.clone());
        assert_eq!(t.device_instance_for_service(&svc), Some(2));
        assert_eq!(t.device_instance_for_service(&service("com.victronenergy.system")), None);
    }

    #[test]
    fn test_remove_service_entry_finds_by_value() {
        let mut t = tables();
        let svc = service("com.victronenergy.battery");
        t.register_service("battery/2".to_string(), svc.clone());
        assert_eq!(t.remove_service_entry(&svc), Some("battery/2".to_string()));
        assert!(t.service_by_short_name("battery/2").is_none());
    }

    #[test]
    fn test_topic_values_sorted_orders_by_topic() {
        let mut t = tables();
        let battery = service("com.victronenergy.battery");
        let system = service("com.victronenergy.system");
        t.add_item(&battery, 1, "Soc", Value::Double(88.0));
        t.add_item(&system, 0, "Serial", Value::Text("abc".into()));

        let pairs = t.topic_values_sorted();
        let topics: Vec<&str> = pairs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            topics,
            vec!["N/d0ff500097c0/battery/1/Soc", "N/d0ff500097c0/system/0/Serial"]
        );
    }

    #[test]
    fn test_service_and_owner_directories() {
        let mut t = tables();
        let svc = service("com.victronenergy.battery");
        t.register_service("battery/1".to_string(), svc.clone());
        t.record_owner(":1.42".to_string(), svc.clone());

        assert_eq!(t.service_by_short_name("battery/1"), Some(&svc));
        assert_eq!(t.service_by_owner(":1.42"), Some(&svc));
        assert_eq!(t.remove_owner(":1.42"), Some(svc.clone()));
        assert_eq!(t.remove_service("battery/1"), Some(svc));
    }
}
