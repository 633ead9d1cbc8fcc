//! Arena-based document tree.
//!
//! All nodes live in one vector; parent/child/sibling links are indices
//! into it. Attributes keep every occurrence in source order, so callers
//! decide how repeated names are resolved.

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with a lowercase (HTML) or as-written (XML) name.
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Text content, references resolved.
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based document tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create an empty document with a root node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(
        &mut self,
        name: impl Into<String>,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        self.alloc(Node::new(NodeData::Element {
            name: name.into(),
            attrs,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text.into())))
    }

    pub fn create_doctype(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype(text.into())))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let id = self.create_element(name, attrs);
        self.append(parent, id);
        id
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Iterate over element children of a node.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&id| self.is_element(id))
    }

    /// Find the first descendant matching a predicate (DFS, `start` excluded).
    pub fn find<F>(&self, start: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut stack: Vec<NodeId> = self.children(start).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                if predicate(node) {
                    return Some(id);
                }
                let mut children: Vec<_> = self.children(id).collect();
                children.reverse();
                stack.extend(children);
            }
        }
        None
    }

    /// Find the first descendant element with a tag name.
    pub fn find_by_tag(&self, start: NodeId, tag: &str) -> Option<NodeId> {
        self.find(start, |node| {
            matches!(&node.data, NodeData::Element { name, .. } if name == tag)
        })
    }

    /// All descendant elements with a tag name, in document order.
    pub fn find_all_by_tag(&self, start: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_tag(start, tag, &mut found);
        found
    }

    fn collect_by_tag(&self, parent: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        for child in self.children(parent) {
            if self.element_name(child) == Some(tag) {
                found.push(child);
            }
            self.collect_by_tag(child, tag, found);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Convenience methods for element nodes.
impl Document {
    /// Element's tag name.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Every attribute of an element, repetitions included.
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value. The last occurrence wins.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .rev()
            .find(|(name, _)| name == attr_name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing every previous occurrence.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: impl Into<String>) {
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.get_mut(id)
        {
            attrs.retain(|(name, _)| name != attr_name);
            attrs.push((attr_name.to_string(), value.into()));
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Text of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of a node and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text_content(id) {
            out.push_str(text);
        }
        for child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Whether a node is a text node holding only whitespace.
    pub fn is_blank_text(&self, id: NodeId) -> bool {
        self.text_content(id).is_some_and(|t| t.trim().is_empty())
    }
}
