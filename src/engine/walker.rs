//! Tree walker — `cparse_template_expand`'s traversal half: collects
//! the three patch lists and performs node-kind-specific name rewriting.
//! Substitution itself runs afterwards over the `PatchRef`s this
//! module returns.

use crate::data::{NodeId, NodeType, Parm, ParmListExt, Tree, type_ops};
use crate::engine::pack_expand;

/// Which substitution a patched slot undergoes at apply time:
/// identifier replace, stringize-then-identifier-replace, or guarded
/// typename replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Name,
    Code,
    Type,
}

/// A deferred reference to a mutable string slot on a still-live node
/// ("store `(node_id, attribute_tag)` pairs and resolve
/// to the current string at apply time").
#[derive(Debug, Clone, Copy)]
pub enum AttrSlot {
    Str(&'static str),
    ParmType(&'static str, usize),
    ParmValue(&'static str, usize),
    TypeListEntry(&'static str, usize),
}

#[derive(Debug, Clone, Copy)]
pub struct PatchRef {
    pub node: NodeId,
    pub slot: AttrSlot,
    pub kind: PatchKind,
}

impl PatchRef {
    pub fn get(&self, tree: &Tree) -> Option<String> {
        let node = tree.get(self.node);
        match self.slot {
            AttrSlot::Str(key) => node.get_str(key).map(str::to_string),
            AttrSlot::ParmType(key, i) => node.get_parms(key)?.get(i).map(|p| p.ty.clone()),
            AttrSlot::ParmValue(key, i) => node.get_parms(key)?.get(i)?.value.clone(),
            AttrSlot::TypeListEntry(key, i) => node.get_type_list(key)?.get(i).cloned(),
        }
    }

    pub fn set(&self, tree: &mut Tree, value: String) {
        let node = tree.get_mut(self.node);
        match self.slot {
            AttrSlot::Str(key) => node.set_str(key, value),
            AttrSlot::ParmType(key, i) => {
                if let Some(parms) = node.get_parms_mut(key)
                    && let Some(p) = parms.get_mut(i)
                {
                    p.ty = value;
                }
            }
            AttrSlot::ParmValue(key, i) => {
                if let Some(parms) = node.get_parms_mut(key)
                    && let Some(p) = parms.get_mut(i)
                {
                    p.value = Some(value);
                }
            }
            AttrSlot::TypeListEntry(key, i) => {
                if let Some(list) = node.get_type_list_mut(key)
                    && let Some(entry) = list.get_mut(i)
                {
                    *entry = value;
                }
            }
        }
    }
}

/// Per-instantiation context threaded down through the walk.
pub struct WalkCtx {
    pub root: NodeId,
    /// The primary template's unqualified base name, e.g. `"Box"`.
    pub tname: String,
    /// The instance's symbolic name, e.g. `"IntBox"`.
    pub rname: String,
    /// The encoded template-argument suffix, e.g. `"<(int)>"`.
    pub templateargs: String,
    /// The trailing variadic template parameter's formal name, if the
    /// primary is variadic.
    pub pack_formal: Option<String>,
    /// The concrete arguments bound to the pack.
    pub pack_actuals: Vec<Parm>,
}

pub fn walk(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, outer_template_seen: bool, patches: &mut Vec<PatchRef>) {
    if tree.get(node).error {
        return;
    }
    match tree.get(node).node_type.clone() {
        NodeType::Template => walk_template(tree, node, ctx, outer_template_seen, patches),
        NodeType::Cdecl => walk_cdecl(tree, node, ctx, patches),
        NodeType::Class => walk_class(tree, node, ctx, outer_template_seen, patches),
        NodeType::Constructor => walk_constructor(tree, node, ctx, patches),
        NodeType::Destructor => walk_destructor(tree, node, ctx, patches),
        NodeType::Using => walk_using(tree, node, patches),
        NodeType::Default => walk_default(tree, node, ctx, outer_template_seen, patches),
        _ => walk_children(tree, node, ctx, outer_template_seen, patches),
    }
}

fn walk_children(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, outer_template_seen: bool, patches: &mut Vec<PatchRef>) {
    let children = tree.get(node).children.clone();
    for child in children {
        walk(tree, child, ctx, outer_template_seen, patches);
    }
}

/// Member templates re-tag, recurse, then restore the `template` tag so a
/// nested template declaration survives as itself; the outermost template
/// (the one actually being instantiated) stays re-tagged.
fn walk_template(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, outer_template_seen: bool, patches: &mut Vec<PatchRef>) {
    let templatetype = tree
        .get(node)
        .get_str("templatetype")
        .unwrap_or("class")
        .to_string();
    tree.get_mut(node).node_type = NodeType::from_str(&templatetype);

    walk_children(tree, node, ctx, true, patches);

    if outer_template_seen {
        tree.get_mut(node).node_type = NodeType::Template;
    }
}

fn walk_cdecl(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, patches: &mut Vec<PatchRef>) {
    patches.push(PatchRef { node, slot: AttrSlot::Str("type"), kind: PatchKind::Type });
    patches.push(PatchRef { node, slot: AttrSlot::Str("decl"), kind: PatchKind::Type });
    if tree.get(node).get_str("storage") == Some("friend") {
        patches.push(PatchRef { node, slot: AttrSlot::Str("name"), kind: PatchKind::Type });
    }
    if tree.get(node).get_str("value").is_some() {
        patches.push(PatchRef { node, slot: AttrSlot::Str("value"), kind: PatchKind::Name });
    }
    if tree.get(node).get_str("code").is_some() {
        patches.push(PatchRef { node, slot: AttrSlot::Str("code"), kind: PatchKind::Code });
    }
    if tree.get(node).get_bool("conversion_operator") {
        patches.push(PatchRef { node, slot: AttrSlot::Str("name"), kind: PatchKind::Code });
        patches.push(PatchRef { node, slot: AttrSlot::Str("sym:name"), kind: PatchKind::Code });
    }
    add_parmlist_patches(tree, node, "parms", ctx, patches);
    add_parmlist_patches(tree, node, "throws", ctx, patches);
}

/// Runs pack expansion (if applicable) on the parameter list attribute
/// `key`, then records a type-list patch per parameter and a name-list
/// patch for any parameter carrying a default value.
fn add_parmlist_patches(tree: &mut Tree, node: NodeId, key: &'static str, ctx: &WalkCtx, patches: &mut Vec<PatchRef>) {
    let Some(parms) = tree.get(node).get_parms(key).cloned() else {
        return;
    };
    let expanded = match &ctx.pack_formal {
        Some(formal) if parms.variadic_tail() && !ctx.pack_actuals.is_empty() => {
            pack_expand::expand_variadic_parms(&parms, formal, &ctx.pack_actuals)
        }
        _ => parms,
    };
    let len = expanded.len();
    let has_value: Vec<bool> = expanded.iter().map(|p| p.value.is_some()).collect();
    tree.get_mut(node).set_parms(key, expanded);

    for i in 0..len {
        patches.push(PatchRef { node, slot: AttrSlot::ParmType(key, i), kind: PatchKind::Type });
        if has_value[i] {
            patches.push(PatchRef { node, slot: AttrSlot::ParmValue(key, i), kind: PatchKind::Name });
        }
    }
}

fn walk_class(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, outer_template_seen: bool, patches: &mut Vec<PatchRef>) {
    for key in ["baselist", "protectedbaselist", "privatebaselist"] {
        walk_baselist(tree, node, key, ctx, patches);
    }
    walk_children(tree, node, ctx, outer_template_seen, patches);
}

fn walk_baselist(tree: &mut Tree, node: NodeId, key: &'static str, ctx: &WalkCtx, patches: &mut Vec<PatchRef>) {
    let Some(list) = tree.get(node).get_type_list(key).cloned() else {
        return;
    };
    let mut expanded = Vec::new();
    for item in list {
        if type_ops::is_variadic(&item) {
            if let Some(formal) = &ctx.pack_formal {
                for actual in &ctx.pack_actuals {
                    let base = type_ops::del_variadic(&item);
                    expanded.push(type_ops::identifier_replace(&base, formal, &actual.ty));
                }
            }
        } else {
            expanded.push(item);
        }
    }
    let len = expanded.len();
    tree.get_mut(node).set_type_list(key, expanded);
    for i in 0..len {
        patches.push(PatchRef { node, slot: AttrSlot::TypeListEntry(key, i), kind: PatchKind::Type });
    }
}

fn walk_constructor(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, patches: &mut Vec<PatchRef>) {
    rewrite_ctor_dtor_name(tree, node, ctx);
    if tree.get(node).get_str("code").is_some() {
        patches.push(PatchRef { node, slot: AttrSlot::Str("code"), kind: PatchKind::Code });
    }
    patches.push(PatchRef { node, slot: AttrSlot::Str("decl"), kind: PatchKind::Type });
    add_parmlist_patches(tree, node, "parms", ctx, patches);
    add_parmlist_patches(tree, node, "throws", ctx, patches);
}

/// Rewritten only when the destructor sits directly under the template
/// root, or under an `extend` block that is itself a direct child of the
/// root (one level of `extend` nesting only).
fn walk_destructor(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, patches: &mut Vec<PatchRef>) {
    if let Some(parent) = tree.get(node).parent
        && should_rewrite_destructor(tree, parent, ctx.root)
    {
        rewrite_ctor_dtor_name(tree, node, ctx);
    }
    if tree.get(node).get_str("code").is_some() {
        patches.push(PatchRef { node, slot: AttrSlot::Str("code"), kind: PatchKind::Code });
    }
}

pub(crate) fn should_rewrite_destructor(tree: &Tree, parent: NodeId, root: NodeId) -> bool {
    if parent == root {
        return true;
    }
    let parent_node = tree.get(parent);
    parent_node.node_type == NodeType::Extend && parent_node.parent == Some(root)
}

fn walk_using(tree: &Tree, node: NodeId, patches: &mut Vec<PatchRef>) {
    if let Some(uname) = tree.get(node).get_str("uname")
        && uname.contains('<')
    {
        patches.push(PatchRef { node, slot: AttrSlot::Str("uname"), kind: PatchKind::Name });
    }
}

fn walk_default(tree: &mut Tree, node: NodeId, ctx: &WalkCtx, outer_template_seen: bool, patches: &mut Vec<PatchRef>) {
    if tree.get(node).get_str("code").is_some() {
        patches.push(PatchRef { node, slot: AttrSlot::Str("code"), kind: PatchKind::Code });
    }
    patches.push(PatchRef { node, slot: AttrSlot::Str("type"), kind: PatchKind::Type });
    patches.push(PatchRef { node, slot: AttrSlot::Str("decl"), kind: PatchKind::Type });
    add_parmlist_patches(tree, node, "parms", ctx, patches);
    add_parmlist_patches(tree, node, "kwargs", ctx, patches);
    if tree.get(node).get_str("pattern").is_some() {
        patches.push(PatchRef { node, slot: AttrSlot::Str("pattern"), kind: PatchKind::Name });
    }
    add_parmlist_patches(tree, node, "throws", ctx, patches);
    walk_children(tree, node, ctx, outer_template_seen, patches);
}

/// the constructor/destructor name-rewriting rule.
fn rewrite_ctor_dtor_name(tree: &mut Tree, node: NodeId, ctx: &WalkCtx) {
    if let Some(name) = tree.get(node).get_str("name").map(str::to_string) {
        let stripped = type_ops::templateprefix(&name);
        let mut newname = name;
        if ctx.tname.contains(&stripped) {
            newname = type_ops::identifier_replace(&newname, &stripped, &ctx.tname);
        }
        if !newname.contains('<') {
            newname.push_str(&ctx.templateargs);
        }
        tree.get_mut(node).set_str("name", newname);
    }
    if let Some(sym_name) = tree.get(node).get_str("sym:name").map(str::to_string) {
        let newsym = if sym_name.contains('<') {
            ctx.rname.clone()
        } else {
            sym_name.replace(&ctx.tname, &ctx.rname)
        };
        tree.get_mut(node).set_str("sym:name", newsym);
    }
}
