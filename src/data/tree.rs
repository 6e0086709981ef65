use std::collections::HashMap;

use super::node::{Attr, Node, NodeType};

pub type NodeId = usize;

/// Arena of AST nodes. Parent/sibling/child links are indices into this
/// vector rather than raw pointers, per the tagged-variant-plus-arena
/// rendition the design notes ask for.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "fixtures", derive(serde::Serialize, serde::Deserialize))]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id, node_type));
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deep-clones the subtree rooted at `id`, remapping intra-subtree
    /// `NodeRef`/`NodeList` attributes and the parent/child/sibling links.
    /// References that point outside the cloned subtree (e.g. a sibling
    /// template declared elsewhere, or a symbol-table scope) are left
    /// pointing at the original node, matching the lifecycle rule
    /// that only the instantiated node is cloned, not the surrounding tree.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut mapping = HashMap::new();
        let new_root = self.clone_recurse(id, None, &mut mapping);
        self.remap_refs(new_root, &mapping);
        new_root
    }

    fn clone_recurse(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        mapping: &mut HashMap<NodeId, NodeId>,
    ) -> NodeId {
        let source = self.nodes[id].clone();
        let new_id = self.nodes.len();
        let mut copy = source;
        copy.id = new_id;
        copy.parent = parent;
        copy.children = Vec::new();
        self.nodes.push(copy);
        mapping.insert(id, new_id);

        let child_ids = self.nodes[id].children.clone();
        for child in child_ids {
            let new_child = self.clone_recurse(child, Some(new_id), mapping);
            self.nodes[new_id].children.push(new_child);
        }
        new_id
    }

    fn remap_refs(&mut self, root: NodeId, mapping: &HashMap<NodeId, NodeId>) {
        let children = self.nodes[root].children.clone();
        if let Some(next) = self.nodes[root].sym_next_sibling
            && let Some(&mapped) = mapping.get(&next)
        {
            self.nodes[root].sym_next_sibling = Some(mapped);
        }
        for (_, attr) in self.nodes[root].attrs.iter_mut() {
            match attr {
                Attr::NodeRef(r) => {
                    if let Some(&mapped) = mapping.get(r) {
                        *r = mapped;
                    }
                }
                Attr::NodeList(list) => {
                    for r in list.iter_mut() {
                        if let Some(&mapped) = mapping.get(r) {
                            *r = mapped;
                        }
                    }
                }
                _ => {}
            }
        }
        for child in children {
            self.remap_refs(child, mapping);
        }
    }
}
