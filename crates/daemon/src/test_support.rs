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

//! In-memory [`ObjectBus`], [`Broker`], and [`CloudRegistrator`] implementations, so the
//! discovery engine, dispatcher, and request router can be exercised without a real D-Bus
//! connection or broker socket.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vebus_broker::{Broker, BrokerError};
use vebus_core::Value;
use vebus_objectbus::{EventStream, ObjectBus, ObjectBusError, ObjectBusEvent};

use crate::registrator::CloudRegistrator;

#[derive(Default)]
struct FakeObjectBusState {
    values: HashMap<(String, String), Value>,
    owners: HashMap<String, String>,
    names: Vec<String>,
    introspect_xml: HashMap<(String, String), String>,
    set_calls: Vec<(String, String, Value)>,
}

#[derive(Default)]
pub struct FakeObjectBus {
    state: Mutex<FakeObjectBusState>,
}

impl FakeObjectBus {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(self, service: &str, owner: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.names.push(service.to_string());
            state.owners.insert(service.to_string(), owner.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_value(self, service: &str, path: &str, value: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .values
            .insert((service.to_string(), path.to_string()), value);
        self
    }

    #[must_use]
    pub fn with_introspect(self, service: &str, path: &str, xml: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .introspect_xml
            .insert((service.to_string(), path.to_string()), xml.to_string());
        self
    }

    pub fn set_calls(&self) -> Vec<(String, String, Value)> {
        self.state.lock().unwrap().set_calls.clone()
    }
}

#[async_trait]
impl ObjectBus for FakeObjectBus {
    async fn list_names(&self) -> Result<Vec<String>, ObjectBusError> {
        Ok(self.state.lock().unwrap().names.clone())
    }

    async fn name_owner(&self, service: &str) -> Result<String, ObjectBusError> {
        self.state
            .lock()
            .unwrap()
            .owners
            .get(service)
            .cloned()
            .ok_or_else(|| ObjectBusError::ServiceUnreachable { service: service.to_string() })
    }

    async fn get_value(&self, service: &str, path: &str) -> Result<Value, ObjectBusError> {
        self.state
            .lock()
            .unwrap()
            .values
            .get(&(service.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| ObjectBusError::UnknownObjectOrMethod {
                service: service.to_string(),
                detail: format!("no fake value registered for {path}"),
            })
    }

    async fn set_value(&self, service: &str, path: &str, value: Value) -> Result<(), ObjectBusError> {
        let mut state = self.state.lock().unwrap();
        state.set_calls.push((service.to_string(), path.to_string(), value.clone()));
        state.values.insert((service.to_string(), path.to_string()), value);
        Ok(())
    }

    async fn introspect(&self, service: &str, path: &str) -> Result<String, ObjectBusError> {
        self.state
            .lock()
            .unwrap()
            .introspect_xml
            .get(&(service.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| ObjectBusError::UnknownObjectOrMethod {
                service: service.to_string(),
                detail: format!("no fake introspection registered for {path}"),
            })
    }

    fn events(&self) -> EventStream {
        Box::pin(futures::stream::pending::<ObjectBusEvent>())
    }
}

#[derive(Default)]
struct FakeBrokerState {
    connected: bool,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>, bool)>,
}

#[derive(Default)]
pub struct FakeBroker {
    state: Mutex<FakeBrokerState>,
}

impl FakeBroker {
    #[must_use]
    pub fn connected() -> Self {
        let broker = Self::default();
        broker.state.lock().unwrap().connected = true;
        broker
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>, bool)> {
        self.state.lock().unwrap().published.clone()
    }
}

#[async_trait]
impl Broker for FakeBroker {
    async fn subscribe(&self, pattern: &str) -> Result<(), BrokerError> {
        self.state.lock().unwrap().subscriptions.push(pattern.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), BrokerError> {
        self.state.lock().unwrap().published.push((topic.to_string(), payload, retain));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        self.state.lock().unwrap().connected = false;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRegistrator {
    client_id: Option<String>,
    register_calls: AtomicUsize,
}

impl FakeRegistrator {
    #[must_use]
    pub fn with_client_id(client_id: &str) -> Self {
        Self { client_id: Some(client_id.to_string()), register_calls: AtomicUsize::new(0) }
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudRegistrator for FakeRegistrator {
    fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    async fn register(&self) {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
    }
}
