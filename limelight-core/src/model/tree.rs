use anyhow::{bail, Context, Result};

/// Handle into a [`DocTree`] arena.
///
/// Slots are never reused within the lifetime of a tree, so a stale id held
/// across document mutation simply fails lookup instead of aliasing a new
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Payload of a single tree node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// An id-addressed document tree
///
/// Mirrors the shape of a rendered markup document: elements with ordered
/// children, text at the leaves. All structural surgery the annotation
/// engine performs (splitting text leaves, wrapping sibling runs, unwrapping
/// markers, re-merging text) goes through this type.
#[derive(Debug, Clone)]
pub struct DocTree {
    slots: Vec<Option<Slot>>,
    root: NodeId,
}

impl DocTree {
    /// Create a tree with a single root element
    pub fn new(root_tag: &str) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.alloc(NodeData::Element {
            tag: root_tag.to_string(),
            attrs: Vec::new(),
        });
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            parent: None,
            children: Vec::new(),
            data,
        }));
        id
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Whether the id still refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).map(|s| &s.data)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Element { attrs, .. }) => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attrs, .. }) =
            self.slot_mut(id).map(|s| &mut s.data)
        {
            if let Some(entry) = attrs.iter_mut().find(|(k, _)| k == name) {
                entry.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Position of a node within its parent's child list
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        if !self.contains(parent) || !self.contains(child) {
            bail!("insert_child on removed node");
        }
        if self.parent(child).is_some() {
            bail!("child is still attached");
        }
        let slot = self
            .slot_mut(parent)
            .context("parent slot missing")?;
        let index = index.min(slot.children.len());
        slot.children.insert(index, child);
        if let Some(c) = self.slot_mut(child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// Remove a node from its parent's child list, keeping it alive
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.slot_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(s) = self.slot_mut(id) {
            s.parent = None;
        }
    }

    /// Detach and tombstone a node. The caller must have moved any children
    /// it wants to keep out beforehand.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        if id.0 < self.slots.len() {
            self.slots[id.0] = None;
        }
    }

    /// Split a text leaf at `byte_offset`, truncating the node in place and
    /// inserting the remainder as a new text sibling just after it. Returns
    /// the id of the new tail node.
    pub fn split_text(&mut self, id: NodeId, byte_offset: usize) -> Result<NodeId> {
        let text = self
            .text(id)
            .context("split_text target is not a text node")?;
        if byte_offset == 0 || byte_offset >= text.len() {
            bail!("split offset {} outside (0, {})", byte_offset, text.len());
        }
        if !text.is_char_boundary(byte_offset) {
            bail!("split offset {} is not a char boundary", byte_offset);
        }
        let tail = text[byte_offset..].to_string();
        if let Some(NodeData::Text(t)) = self.slot_mut(id).map(|s| &mut s.data) {
            t.truncate(byte_offset);
        }
        let parent = self.parent(id).context("split_text target is detached")?;
        let index = self.child_index(id).context("child index missing")? + 1;
        let tail_id = self.create_text(tail);
        self.insert_child(parent, index, tail_id)?;
        Ok(tail_id)
    }

    /// Join runs of adjacent text children into the first node of each run,
    /// the inverse of the splits introduced while wrapping markers.
    pub fn merge_adjacent_text(&mut self, parent: NodeId) {
        let children = self.children(parent).to_vec();
        let mut absorbed: Vec<NodeId> = Vec::new();
        let mut head: Option<NodeId> = None;
        for child in children {
            match self.text(child) {
                Some(t) => {
                    if let Some(h) = head {
                        let tail = t.to_string();
                        if let Some(NodeData::Text(ht)) =
                            self.slot_mut(h).map(|s| &mut s.data)
                        {
                            ht.push_str(&tail);
                        }
                        absorbed.push(child);
                    } else {
                        head = Some(child);
                    }
                }
                None => head = None,
            }
        }
        for id in absorbed {
            self.remove(id);
        }
    }
}
