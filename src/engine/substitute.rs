//! Substitution engine — the tail of `Swig_cparse_template_expand`:
//! given the formal/actual argument pairs and the three patch lists
//! collected by the walker, performs the identifier/stringize/typename
//! replacements.

use crate::data::{Parm, ScopeId, SymbolTable, Tree, type_ops};
use crate::engine::walker::{PatchKind, PatchRef};

/// `value` wins over `type` for substitution display when both are
/// present on a template argument.
fn value_or_type(arg: &Parm) -> &str {
    arg.value.as_deref().unwrap_or(&arg.ty)
}

/// One formal/actual pair fully resolved to its display form, ready to
/// drive the patch-list replacements.
struct ResolvedArg {
    name: String,
    display: String,
}

fn resolve_arg(arg: &Parm, symbols: &SymbolTable, scope: Option<ScopeId>) -> Option<ResolvedArg> {
    let name = arg.name.clone()?;
    let q = symbols.typedef_reduce(value_or_type(arg), scope);
    let mut d = symbols.type_qualify(&q, scope);
    if type_ops::is_template(&d) {
        d = symbols.template_deftype(&d);
    }
    let display = type_ops::str_display(&d);
    Some(ResolvedArg { name, display })
}

/// Propagates `name -> d` into every later sibling's default value, the
/// argument-dependent default expansion.
fn propagate_into_later_defaults(formal_params: &mut [Parm], from: usize, name: &str, d: &str) {
    for p in formal_params.iter_mut().skip(from + 1) {
        if let Some(v) = &p.value {
            p.value = Some(type_ops::identifier_replace(v, name, d));
        }
    }
}

/// Skip `typename_replace` iff the looked-up node's `sym:name` equals the
/// primary's `sym:name` and the looked-up node carries no `templatetype`
/// attribute — a heuristic collision guard against substituting a name that
/// merely happens to match the template's own.
pub fn should_typename_replace(
    candidate: &str,
    primary_sym_name: &str,
    tree: &Tree,
    symbols: &SymbolTable,
    scope: Option<ScopeId>,
) -> bool {
    let base = type_ops::base(candidate);
    let Some(found) = symbols.clookup(&base, scope) else {
        return true;
    };
    let found_node = tree.get(found);
    let tyname = found_node.get_str("sym:name");
    let is_same_name = tyname == Some(primary_sym_name);
    let has_templatetype = found_node.get_str("templatetype").is_some();
    !(is_same_name && !has_templatetype)
}

/// Applies all substitutions described by `patches` using the resolved
/// `formal_params`/`actual_args` pairs, the primary's base/instance names
/// for the final `typename_replace`, and the pack formal/actuals for the
/// guard `variadic_replace` pass.
#[allow(clippy::too_many_arguments)]
pub fn apply_substitutions(
    tree: &mut Tree,
    patches: &[PatchRef],
    formal_params: &mut Vec<Parm>,
    primary_base_name: &str,
    instance_name: &str,
    primary_sym_name: &str,
    pack_formal: Option<&str>,
    pack_actuals: &[Parm],
    symbols: &SymbolTable,
    scope: Option<ScopeId>,
) {
    for i in 0..formal_params.len() {
        let Some(resolved) = resolve_arg(&formal_params[i], symbols, scope) else {
            continue;
        };
        propagate_into_later_defaults(formal_params, i, &resolved.name, &resolved.display);

        for patch in patches {
            let Some(current) = patch.get(tree) else { continue };
            let updated = match patch.kind {
                PatchKind::Name => type_ops::identifier_replace(&current, &resolved.name, &resolved.display),
                PatchKind::Code => {
                    let stringized = current.replace(&format!("#{}", resolved.name), &format!("\"{}\"", resolved.display));
                    type_ops::identifier_replace(&stringized, &resolved.name, &resolved.display)
                }
                PatchKind::Type => {
                    let mut t = current.clone();
                    if let Some(formal) = pack_formal {
                        let actual_types: Vec<String> = pack_actuals.iter().map(|p| p.ty.clone()).collect();
                        type_ops::variadic_replace(&mut t, formal, &actual_types);
                    }
                    if should_typename_replace(&t, primary_sym_name, tree, symbols, scope) {
                        type_ops::typename_replace(&mut t, &resolved.name, &resolved.display);
                        type_ops::typename_replace(&mut t, primary_base_name, instance_name);
                    }
                    t
                }
            };
            if updated != current {
                patch.set(tree, updated);
            }
        }
    }
}
