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

//! The cloud-credential registrator: an opaque external collaborator.
//!
//! Provisioning cloud broker credentials is deployment-specific (it talks to a provisioning
//! service this bridge has no knowledge of), so it is represented purely as a trait boundary. A
//! logging-only default implementation is provided for the common case where no such
//! infrastructure is configured.

use async_trait::async_trait;

/// Provisions credentials with the cloud-side broker on behalf of this bridge instance.
#[async_trait]
pub trait CloudRegistrator: Send + Sync {
    /// The MQTT client id the registrator expects the bridge to use, if it assigns one.
    ///
    /// `None` means no cloud connection-state meta-topic should be subscribed to.
    fn client_id(&self) -> Option<&str>;

    /// Registers (or re-registers) this bridge's credentials with the cloud broker.
    ///
    /// Called once at startup when `--init-broker` is set, and again on every observed loss of
    /// the cloud-side connection.
    async fn register(&self);
}

/// A [`CloudRegistrator`] that only logs; used whenever no cloud provisioning endpoint is
/// configured for this bridge instance.
#[derive(Debug, Default, Clone)]
pub struct LoggingRegistrator {
    client_id: Option<String>,
}

impl LoggingRegistrator {
    #[must_use]
    pub fn new(client_id: Option<String>) -> Self {
        Self { client_id }
    }
}

#[async_trait]
impl CloudRegistrator for LoggingRegistrator {
    fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    async fn register(&self) {
        tracing::info!("cloud broker registration requested (no registrator configured)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_registrator_has_no_client_id_by_default() {
        let reg = LoggingRegistrator::default();
        assert!(reg.client_id().is_none());
        reg.register().await;
    }

    #[tokio::test]
    async fn test_logging_registrator_exposes_configured_client_id() {
        let reg = LoggingRegistrator::new(Some("vrm-123".to_string()));
        assert_eq!(reg.client_id(), Some("vrm-123"));
    }
}
