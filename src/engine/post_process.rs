//! Post-processor — normalizes function declarators after
//! substitution injected pointer/reference/function layers into a
//! `cdecl`'s `type` attribute.

use crate::data::{NodeId, NodeType, Tree, type_ops};

/// Moves the non-qualifier, non-array prefix fragments of `ty` onto the
/// tail of `decl`, leaving only the qualifier/array fragments (if any) as
/// the new `type`. `name` is accepted for symmetry with the caller's other
/// per-declarator helpers but is not itself rewritten here.
pub fn fix_function_decl(_name: &str, decl: &mut String, ty: &mut String) {
    let (frags, base) = type_ops::split(ty);
    let mut moved = String::new();
    let mut kept = String::new();
    for f in &frags {
        if type_ops::is_qualifier(f) || type_ops::is_array(f) {
            kept.push_str(f);
        } else {
            moved.push_str(f);
        }
    }
    decl.push_str(&moved);
    *ty = format!("{kept}{base}");
}

/// Walks the (already-substituted) subtree, applying `fix_function_decl`
/// to every `cdecl` whose `decl` encodes a function type.
pub fn post_process(tree: &mut Tree, node: NodeId) {
    if tree.get(node).node_type == NodeType::Cdecl {
        let decl = tree.get(node).get_str("decl").map(str::to_string);
        if let Some(decl) = decl
            && type_ops::is_function(&decl)
        {
            let mut ty = tree.get(node).get_str("type").unwrap_or_default().to_string();
            let mut new_decl = decl;
            fix_function_decl(tree.get(node).get_str("name").unwrap_or_default(), &mut new_decl, &mut ty);
            tree.get_mut(node).set_str("decl", new_decl);
            tree.get_mut(node).set_str("type", ty);
        }
    }
    let children = tree.get(node).children.clone();
    for child in children {
        post_process(tree, child);
    }
}
