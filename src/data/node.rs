use std::collections::HashMap;

use super::parm::ParmList;
use super::tree::NodeId;

/// Closed tag set ("at least {template, cdecl, class,
/// constructor, destructor, using, extend, other}"). `Other` preserves the
/// always-present fallback without reopening the enum to arbitrary strings
/// everywhere else in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fixtures", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    Template,
    Cdecl,
    Class,
    Constructor,
    Destructor,
    Using,
    Extend,
    Default,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Template => "template",
            NodeType::Cdecl => "cdecl",
            NodeType::Class => "class",
            NodeType::Constructor => "constructor",
            NodeType::Destructor => "destructor",
            NodeType::Using => "using",
            NodeType::Extend => "extend",
            NodeType::Default => "default",
            NodeType::Other(s) => s,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "template" => NodeType::Template,
            "cdecl" => NodeType::Cdecl,
            "class" => NodeType::Class,
            "constructor" => NodeType::Constructor,
            "destructor" => NodeType::Destructor,
            "using" => NodeType::Using,
            "extend" => NodeType::Extend,
            "default" => NodeType::Default,
            other => NodeType::Other(other.to_string()),
        }
    }
}

/// An attribute value. Rather than the source's "string or node" union,
/// this closes over the handful of shapes actually needed:
/// plain strings, flags, parameter chains, base-class type lists, and
/// cross-references to other nodes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "fixtures", derive(serde::Serialize, serde::Deserialize))]
pub enum Attr {
    Str(String),
    Bool(bool),
    Parms(ParmList),
    TypeList(Vec<String>),
    NodeRef(NodeId),
    NodeList(Vec<NodeId>),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "fixtures", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub attrs: HashMap<String, Attr>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Symbol-table sibling chain — a distinct namespace from `children`
    /// ("sibling links (both AST siblings and symbol-table
    /// siblings — distinct namespaces)").
    pub sym_next_sibling: Option<NodeId>,
    pub error: bool,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType) -> Self {
        Self {
            id,
            node_type,
            attrs: HashMap::new(),
            children: Vec::new(),
            parent: None,
            sym_next_sibling: None,
            error: false,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key) {
            Some(Attr::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.attrs.insert(key.to_string(), Attr::Str(value.into()));
    }

    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.attrs.get(key), Some(Attr::Bool(true)))
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.attrs.insert(key.to_string(), Attr::Bool(value));
    }

    pub fn get_parms(&self, key: &str) -> Option<&ParmList> {
        match self.attrs.get(key) {
            Some(Attr::Parms(p)) => Some(p),
            _ => None,
        }
    }

    pub fn get_parms_mut(&mut self, key: &str) -> Option<&mut ParmList> {
        match self.attrs.get_mut(key) {
            Some(Attr::Parms(p)) => Some(p),
            _ => None,
        }
    }

    pub fn set_parms(&mut self, key: &str, parms: ParmList) {
        self.attrs.insert(key.to_string(), Attr::Parms(parms));
    }

    pub fn get_type_list(&self, key: &str) -> Option<&Vec<String>> {
        match self.attrs.get(key) {
            Some(Attr::TypeList(l)) => Some(l),
            _ => None,
        }
    }

    pub fn get_type_list_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        match self.attrs.get_mut(key) {
            Some(Attr::TypeList(l)) => Some(l),
            _ => None,
        }
    }

    pub fn set_type_list(&mut self, key: &str, list: Vec<String>) {
        self.attrs.insert(key.to_string(), Attr::TypeList(list));
    }

    pub fn get_node_ref(&self, key: &str) -> Option<NodeId> {
        match self.attrs.get(key) {
            Some(Attr::NodeRef(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn set_node_ref(&mut self, key: &str, id: NodeId) {
        self.attrs.insert(key.to_string(), Attr::NodeRef(id));
    }

    pub fn get_node_list(&self, key: &str) -> Option<&Vec<NodeId>> {
        match self.attrs.get(key) {
            Some(Attr::NodeList(l)) => Some(l),
            _ => None,
        }
    }

    pub fn set_node_list(&mut self, key: &str, list: Vec<NodeId>) {
        self.attrs.insert(key.to_string(), Attr::NodeList(list));
    }

    pub fn remove(&mut self, key: &str) -> Option<Attr> {
        self.attrs.remove(key)
    }
}
