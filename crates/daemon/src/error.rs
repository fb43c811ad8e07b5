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

//! Daemon-level failure modes that need to be distinguished for control flow.
//!
//! Anything else crossing a function boundary uses `anyhow::Error` with `.context(...)` instead
//! of growing this enum a variant per call site.

use thiserror::Error;
use vebus_broker::BrokerError;
use vebus_objectbus::ObjectBusError;

/// Failure modes the request router and discovery engine need to match on directly.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    ObjectBus(#[from] ObjectBusError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown service for topic: {0}")]
    UnknownService(String),
}
