//! Top-level orchestration tying the walker, substitution engine, and
//! post-processor together — `Swig_cparse_template_expand` (the walk, substitution,
//! and post-process passes). `node` must already be the clone the caller intends to mutate
//! (cloning happens before this is called).

use crate::data::{NodeId, ParmList, ScopeId, SymbolTable, Tree, type_ops};
use crate::engine::{post_process, substitute};
use crate::engine::walker::{self, WalkCtx};

/// Mutates `node` in place: retags it from `template` to its declared
/// kind, substitutes every formal parameter with its resolved argument,
/// and normalizes function declarators left non-canonical by the
/// substitution. `tparms` is the output of
/// [`crate::engine::arg_preparer::expand_template_parms`].
pub fn template_expand(
    tree: &mut Tree,
    node: NodeId,
    rname: &str,
    mut tparms: ParmList,
    tscope: Option<ScopeId>,
    symbols: &SymbolTable,
) {
    if tree.get(node).error {
        return;
    }

    let primary_base_name = tree.get(node).get_str("name").unwrap_or_default().to_string();
    let primary_sym_name = tree
        .get(node)
        .get_str("sym:name")
        .unwrap_or(&primary_base_name)
        .to_string();
    let templateparms = tree.get(node).get_parms("templateparms").cloned().unwrap_or_default();

    let arg_types: Vec<String> = tparms.iter().map(|p| p.ty.clone()).collect();
    let mut templateargs = String::new();
    type_ops::add_template(&mut templateargs, &arg_types.join(","));

    let (pack_formal, pack_actuals) = match templateparms.last() {
        Some(last) if type_ops::is_variadic(&last.ty) => {
            let prefix_len = templateparms.len() - 1;
            let actuals = tparms.get(prefix_len..).map(<[_]>::to_vec).unwrap_or_default();
            (last.name.clone(), actuals)
        }
        _ => (None, Vec::new()),
    };

    let ctx = WalkCtx {
        root: node,
        tname: primary_base_name.clone(),
        rname: rname.to_string(),
        templateargs,
        pack_formal: pack_formal.clone(),
        pack_actuals: pack_actuals.clone(),
    };

    let mut patches = Vec::new();
    walker::walk(tree, node, &ctx, false, &mut patches);

    substitute::apply_substitutions(
        tree,
        &patches,
        &mut tparms,
        &primary_base_name,
        rname,
        &primary_sym_name,
        pack_formal.as_deref(),
        &pack_actuals,
        symbols,
        tscope,
    );

    post_process::post_process(tree, node);

    for key in ["baselist", "protectedbaselist", "privatebaselist"] {
        if let Some(list) = tree.get(node).get_type_list(key).cloned() {
            let qualified: Vec<String> = list.iter().map(|t| symbols.type_qualify(t, tscope)).collect();
            tree.get_mut(node).set_type_list(key, qualified);
        }
    }
}
