//! In-memory system definition model.
//!
//! A [`SystemDefinition`] is a flat collection of named nodes plus the
//! device definitions those nodes refer to. The package engine treats it as
//! opaque apart from looking nodes up by name; everything else is handed to
//! the serializers in [`crate::serializer`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form key/value settings attached to nodes and devices.
///
/// A `BTreeMap` keeps serialized output stable between runs.
pub type Properties = BTreeMap<String, String>;

/// A single node (ECU, gateway, sensor) in a system definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    device_type: String,
    #[serde(default)]
    properties: Properties,
}

impl Node {
    /// Create a node with no properties.
    ///
    /// # Examples
    ///
    /// ```
    /// use xcfg_common::model::Node;
    ///
    /// let node = Node::new("ECU_A", "ESX3CM");
    /// assert_eq!(node.name(), "ECU_A");
    /// assert_eq!(node.device_type(), "ESX3CM");
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_type: device_type.into(),
            properties: Properties::new(),
        }
    }

    /// Attach a property, replacing any previous value for `key`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Return the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the device type this node is an instance of.
    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Return the node properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// Static configuration data for one device type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    device_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    properties: Properties,
}

impl DeviceDefinition {
    /// Create a device definition with an empty property set.
    #[must_use]
    pub fn new(device_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            device_type: device_type.into(),
            description: description.into(),
            properties: Properties::new(),
        }
    }

    /// Attach a property, replacing any previous value for `key`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Return the device type identifier.
    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Return the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Return the device properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// A caller-owned collection of nodes and device definitions.
///
/// # Examples
///
/// ```
/// use xcfg_common::model::{DeviceDefinition, Node, SystemDefinition};
///
/// let system = SystemDefinition::new(
///     vec![Node::new("ECU_A", "ESX3CM")],
///     vec![DeviceDefinition::new("ESX3CM", "controller")],
/// );
/// assert!(system.find_node("ECU_A").is_some());
/// assert!(system.find_node("ECU_Z").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDefinition {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    devices: Vec<DeviceDefinition>,
}

impl SystemDefinition {
    /// Assemble a system definition from its parts.
    #[must_use]
    pub fn new(nodes: Vec<Node>, devices: Vec<DeviceDefinition>) -> Self {
        Self { nodes, devices }
    }

    /// Return all nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all device definitions in declaration order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceDefinition] {
        &self.devices
    }

    /// Return the first node whose name matches `name` exactly.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Count the nodes whose name matches `name` exactly.
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.nodes.iter().filter(|node| node.name == name).count()
    }
}
