//! HierarchyNode <-> JSON document
//!
//! Every node becomes `{"tag", "attributes", "children"}`. The document has
//! exactly the shape of the tree: nothing is dropped or reordered.

use serde_json::{Map, Value};

use super::types::{Attributes, HierarchyNode};
use super::HierarchyError;

pub fn to_document(root: &HierarchyNode) -> Value {
    let mut attributes = Map::with_capacity(root.attributes().len());
    for (name, value) in root.attributes().iter() {
        attributes.insert(name.to_string(), Value::String(value.to_string()));
    }

    let children = root.children().iter().map(to_document).collect();

    let mut node = Map::with_capacity(3);
    node.insert("tag".to_string(), Value::String(root.tag().to_string()));
    node.insert("attributes".to_string(), Value::Object(attributes));
    node.insert("children".to_string(), Value::Array(children));
    Value::Object(node)
}

/// Rebuild a tree from a document produced by [`to_document`]
pub fn from_document(document: &Value) -> Result<HierarchyNode, HierarchyError> {
    let node = document
        .as_object()
        .ok_or_else(|| invalid("node is not an object"))?;

    let tag = node
        .get("tag")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing \"tag\""))?;

    let mut attributes = Attributes::new();
    if let Some(raw) = node.get("attributes") {
        let raw = raw
            .as_object()
            .ok_or_else(|| invalid("\"attributes\" is not an object"))?;
        for (name, value) in raw {
            let value = value
                .as_str()
                .ok_or_else(|| invalid(&format!("attribute \"{}\" is not a string", name)))?;
            attributes.insert(name.as_str(), value);
        }
    }

    let children = match node.get("children") {
        Some(Value::Array(items)) => items
            .iter()
            .map(from_document)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(invalid("\"children\" is not an array")),
        None => Vec::new(),
    };

    Ok(HierarchyNode::from_parts(tag, attributes, children))
}

fn invalid(reason: &str) -> HierarchyError {
    HierarchyError::InvalidDocument(reason.to_string())
}
