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

//! The message bus: topic matching, subscription TTLs, the topic/value tables, and the publish
//! queue that sits between discovered values and the broker adapter.

pub mod queue;
pub mod subscription;
pub mod table;
pub mod topic;

pub use queue::PublishQueue;
pub use subscription::SubscriptionRegistry;
pub use table::{AddItemOutcome, Tables};
pub use topic::{Pattern, ShortTopic, short_topic_of};
