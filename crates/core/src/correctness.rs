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

//! Lightweight precondition checks used at the boundaries of the bridge's data model.

/// Message used when a conversion which is expected to always succeed fails anyway.
pub const FAILED: &str = "Correctness failed";

/// Checks `value` is not empty and contains no interior whitespace-only segments.
///
/// # Errors
///
/// Returns an error describing `what` if the check fails.
pub fn check_non_empty_string(value: &str, what: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{what} was empty or whitespace, was {value:?}");
    }
    Ok(())
}

/// Checks `path` begins with `/`, as the bridge's data model requires (see UID definition).
///
/// # Errors
///
/// Returns an error if `path` is empty or does not start with a slash.
pub fn check_valid_path(path: &str) -> anyhow::Result<()> {
    if path.is_empty() {
        anyhow::bail!("path was empty");
    }
    if !path.starts_with('/') {
        anyhow::bail!("path `{path}` must start with '/'");
    }
    Ok(())
}
