//! A concrete stand-in for the symbol-table facility, treated elsewhere
//! as an external collaborator. There is no upstream parser/symtab crate
//! in this repository to bind against, so the operations listed below
//! are implemented directly, and nothing more — see DESIGN.md's Open
//! Question decisions for the rationale.

use std::collections::HashMap;

use itertools::Itertools;

use super::parm::ParmList;
use super::tree::NodeId;
use super::type_ops;

pub type ScopeId = usize;

#[derive(Debug, Default, Clone)]
struct Scope {
    name: String,
    parent: Option<ScopeId>,
    symbols: HashMap<String, NodeId>,
    overloads: HashMap<String, Vec<NodeId>>,
    typedefs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct NodeLocation {
    scope: ScopeId,
    name: String,
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    node_locations: HashMap<NodeId, NodeLocation>,
    /// Declared template parameter lists keyed by template base name, used
    /// by `template_deftype`/`template_defargs` to fill defaults.
    template_defaults: HashMap<String, ParmList>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            node_locations: HashMap::new(),
            template_defaults: HashMap::new(),
        }
    }

    pub fn global(&self) -> ScopeId {
        0
    }

    pub fn new_scope(&mut self, parent: ScopeId, name: impl Into<String>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            name: name.into(),
            parent: Some(parent),
            ..Default::default()
        });
        id
    }

    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, node: NodeId) {
        let name = name.into();
        self.scopes[scope]
            .overloads
            .entry(name.clone())
            .or_default()
            .push(node);
        self.scopes[scope].symbols.insert(name.clone(), node);
        self.node_locations
            .insert(node, NodeLocation { scope, name });
    }

    pub fn declare_typedef(
        &mut self,
        scope: ScopeId,
        alias: impl Into<String>,
        underlying: impl Into<String>,
    ) {
        self.scopes[scope]
            .typedefs
            .insert(alias.into(), underlying.into());
    }

    pub fn declare_template(&mut self, name: impl Into<String>, templateparms: ParmList) {
        self.template_defaults.insert(name.into(), templateparms);
    }

    pub fn clookup_local(&self, name: &str, scope: ScopeId) -> Option<NodeId> {
        self.scopes.get(scope)?.symbols.get(name).copied()
    }

    pub fn clookup(&self, name: &str, scope: Option<ScopeId>) -> Option<NodeId> {
        let mut cur = scope;
        while let Some(s) = cur {
            if let Some(n) = self.clookup_local(name, s) {
                return Some(n);
            }
            cur = self.scopes.get(s).and_then(|sc| sc.parent);
        }
        None
    }

    /// The scope a node was `declare`d into, used by the locator's
    /// explicit-specialization search ("look up `tname` locally in the
    /// primary's scope").
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.node_locations.get(&node).map(|loc| loc.scope)
    }

    /// All declarations sharing `name` in the nearest enclosing scope that
    /// has any — the overload set consulted by the function-template path
    /// of the locator.
    pub fn overload_set(&self, name: &str, scope: Option<ScopeId>) -> Vec<NodeId> {
        let mut cur = scope;
        while let Some(s) = cur {
            if let Some(set) = self.scopes.get(s).and_then(|sc| sc.overloads.get(name)) {
                return set.clone();
            }
            cur = self.scopes.get(s).and_then(|sc| sc.parent);
        }
        Vec::new()
    }

    pub fn typedef_reduce(&self, ty: &str, scope: Option<ScopeId>) -> String {
        let mut cur = ty.to_string();
        let mut guard = 0;
        loop {
            guard += 1;
            if guard > 64 {
                break;
            }
            let b = type_ops::base(&cur);
            let p = type_ops::prefix(&cur);
            let mut resolved = None;
            let mut s = scope;
            while let Some(sc) = s {
                if let Some(under) = self.scopes[sc].typedefs.get(&b) {
                    resolved = Some(under.clone());
                    break;
                }
                s = self.scopes[sc].parent;
            }
            match resolved {
                Some(under) if under != cur => cur = format!("{p}{under}"),
                _ => break,
            }
        }
        cur
    }

    fn qualified_name_of(&self, node: NodeId) -> String {
        let Some(loc) = self.node_locations.get(&node) else {
            return String::new();
        };
        let mut ancestors = Vec::new();
        let mut cur = Some(loc.scope);
        while let Some(s) = cur {
            let scope = &self.scopes[s];
            if !scope.name.is_empty() {
                ancestors.push(scope.name.clone());
            }
            cur = scope.parent;
        }
        ancestors.into_iter().rev().chain(std::iter::once(loc.name.clone())).join("::")
    }

    pub fn type_qualify(&self, ty: &str, scope: Option<ScopeId>) -> String {
        let b = type_ops::base(ty);
        let p = type_ops::prefix(ty);
        if b.contains("::") {
            return ty.to_string();
        }
        let head = type_ops::templateprefix(&b);
        let tail = &b[head.len()..];
        match self.clookup(&head, scope) {
            Some(node) => {
                let qualified = self.qualified_name_of(node);
                if qualified.is_empty() {
                    ty.to_string()
                } else {
                    format!("{p}{qualified}{tail}")
                }
            }
            None => ty.to_string(),
        }
    }

    pub fn template_deftype(&self, ty: &str) -> String {
        let b = type_ops::base(ty);
        let p = type_ops::prefix(ty);
        if !type_ops::is_template(&b) {
            return ty.to_string();
        }
        let head = type_ops::templateprefix(&b);
        let Some(primary_parms) = self.template_defaults.get(&head) else {
            return ty.to_string();
        };
        let args = type_ops::template_args(&b);
        if args.len() >= primary_parms.len() {
            return ty.to_string();
        }
        let mut filled = args;
        for parm in &primary_parms[filled.len()..] {
            match &parm.value {
                Some(default) => filled.push(default.clone()),
                None => break,
            }
        }
        let mut new_base = head;
        type_ops::add_template(&mut new_base, &filled.join(","));
        format!("{p}{new_base}")
    }

    pub fn template_defargs(
        &self,
        parms: &ParmList,
        templateparms: &ParmList,
        _tscope: Option<ScopeId>,
        _primary_scope: Option<ScopeId>,
    ) -> ParmList {
        let mut result = parms.clone();
        for tp in templateparms.iter().skip(result.len()) {
            let mut copy = tp.clone();
            copy.default = true;
            result.push(copy);
        }
        result
    }

    pub fn scopename_last(name: &str) -> String {
        name.rsplit("::").next().unwrap_or(name).to_string()
    }

    pub fn sym_name_of(&self, node: NodeId, tree: &super::tree::Tree) -> Option<String> {
        tree.get(node).get_str("sym:name").map(str::to_string)
    }
}
