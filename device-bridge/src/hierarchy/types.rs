use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Node attributes, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set an attribute. An existing name keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One node of a UI tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    tag: String,
    attributes: Attributes,
    children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn from_parts(tag: impl Into<String>, attributes: Attributes, children: Vec<HierarchyNode>) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            children,
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: HierarchyNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn children(&self) -> &[HierarchyNode] {
        &self.children
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_insert_keeps_position() {
        let mut attrs = Attributes::new();
        attrs.insert("text", "a");
        attrs.insert("class", "b");
        attrs.insert("text", "c");

        let names: Vec<_> = attrs.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["text", "class"]);
        assert_eq!(attrs.get("text"), Some("c"));
        assert_eq!(attrs.get("missing"), None);
    }

    #[test]
    fn test_attributes_serialize_in_order() {
        let attrs: Attributes = [("z", "1"), ("a", "2"), ("m", "3")].into_iter().collect();
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2","m":"3"}"#);
    }

    #[test]
    fn test_node_count() {
        let tree = HierarchyNode::new("hierarchy")
            .with_child(HierarchyNode::new("node").with_child(HierarchyNode::new("node")))
            .with_child(HierarchyNode::new("node"));
        assert_eq!(tree.node_count(), 4);
    }
}
