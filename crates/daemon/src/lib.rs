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

//! Mirrors object-bus values onto a broker, and routes broker reads/writes back onto the bus.
//!
//! [`bridge::Bridge`] owns all bridge state; [`discovery`], [`dispatch`], and [`router`] are
//! `impl` blocks on it grouping, respectively, service discovery, bus-change handling, and
//! broker-request handling. [`event_loop`] wires a live [`Bridge`] into a single-task runtime.

pub mod bridge;
pub mod cli;
pub mod diagnostics;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod registrator;
pub mod router;

#[cfg(test)]
mod test_support;

pub use bridge::Bridge;
pub use cli::Cli;
pub use diagnostics::DiagnosticsSnapshot;
pub use error::BridgeError;
pub use registrator::{CloudRegistrator, LoggingRegistrator};
