use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::condition::parse_object_path;
use crate::options::WidgetOptions;
use crate::schema::join_pointer;
use crate::widget::WidgetKind;

/// Expands to every property not placed elsewhere at the same level.
pub const REST_KEY: &str = "*";

/// One entry of a layout document: a bare key or a full node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LayoutItem {
    Key(String),
    Node(LayoutNode),
}

/// Places a schema key, or groups child items when no key is given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoutNode {
    /// Dotted data path relative to the enclosing node, e.g. `address.city`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub widget: Option<WidgetKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LayoutItem>,
    #[serde(flatten)]
    pub options: WidgetOptions,
}

impl LayoutNode {
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }
}

impl LayoutItem {
    /// The key this item places, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            LayoutItem::Key(key) => Some(key),
            LayoutItem::Node(node) => node.key.as_deref(),
        }
    }

    pub fn into_node(self) -> LayoutNode {
        match self {
            LayoutItem::Key(key) => LayoutNode::for_key(key),
            LayoutItem::Node(node) => node,
        }
    }
}

/// Converts a layout key (`a.b[0].c`, `tags[]`) into a relative JSON pointer.
pub fn key_to_pointer(key: &str) -> String {
    join_pointer(
        parse_object_path(key)
            .into_iter()
            .filter(|segment| !segment.is_empty()),
    )
}
