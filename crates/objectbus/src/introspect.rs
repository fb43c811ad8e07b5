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

//! Introspection XML tree walk, used when a service has no bulk `GetValue('/')` listing
//!.
//!
//! A node with no child `<node>` elements and a `com.victronenergy.BusItem` `<interface>` is a
//! leaf to read; otherwise each child node is a path segment to recurse into.

/// The bus-item interface a leaf node must declare to be worth reading.
pub const BUS_ITEM_INTERFACE: &str = "com.victronenergy.BusItem";

/// A path discovered by walking introspection XML, ready to be read with `GetValue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPath(pub String);

/// Parses `xml` (the result of an `Introspect` call at `path`) and returns the leaf paths to
/// read, or the child paths to recurse into if `path` itself is not a leaf.
///
/// # Errors
///
/// Returns an error if `xml` is not well-formed introspection data.
pub fn walk(path: &str, xml: &str) -> anyhow::Result<IntrospectStep> {
    let node: zbus_xml::Node = xml.parse()?;

    let children: Vec<&zbus_xml::Node> = node.nodes().iter().collect();
    if children.is_empty() {
        let is_bus_item = node
            .interfaces()
            .iter()
            .any(|iface| iface.name().as_str() == BUS_ITEM_INTERFACE);
        return Ok(if is_bus_item {
            IntrospectStep::Leaf
        } else {
            IntrospectStep::Empty
        });
    }

    let mut child_paths = Vec::with_capacity(children.len());
    for child in children {
        if let Some(name) = child.name() {
            child_paths.push(DiscoveredPath(join_path(path, name)));
        }
    }
    Ok(IntrospectStep::Children(child_paths))
}

/// The outcome of introspecting one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntrospectStep {
    /// This node is a bus item; read it directly.
    Leaf,
    /// This node has no children and is not a bus item; nothing to do.
    Empty,
    /// Recurse into these child paths.
    Children(Vec<DiscoveredPath>),
}

/// Joins a parent introspection path with a child node name, never producing a double slash.
#[must_use]
pub fn join_path(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_never_doubles_slash() {
        assert_eq!(join_path("/", "Soc"), "/Soc");
        assert_eq!(join_path("/Dc", "0"), "/Dc/0");
        assert_eq!(join_path("/Dc/", "0"), "/Dc/0");
    }
}
