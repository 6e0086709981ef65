//! Template locator — `template_locate`.

use crate::data::{NodeId, NodeType, ParmList, ParmListExt, ScopeId, SymbolTable, Tree, type_ops};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::engine::partial_match;

/// Kind of template the primary declares, read off its `templatetype`
/// attribute. Function templates skip partial-specialization matching
/// entirely (see `locate_function_template`).
fn is_function_template(tree: &Tree, primary: NodeId) -> bool {
    matches!(tree.get(primary).get_str("templatetype"), Some("cdecl"))
}

/// A *declared* template parameter is required iff it carries no default
/// `value` — distinct from `Parm::default`, which marks a parameter in an
/// already-expanded argument list as filled in from one.
fn required_count(parms: &ParmList) -> usize {
    parms.iter().filter(|p| p.value.is_none()).count()
}

fn validate_class_arity(given: usize, templateparms: &ParmList, name: &str) -> Result<(), Diagnostic> {
    let required = required_count(templateparms);
    if templateparms.variadic_tail() {
        let min = required.saturating_sub(1);
        if given < min {
            return Err(Diagnostic::ArityMismatch {
                name: name.to_string(),
                given,
                min,
                max: None,
            });
        }
    } else {
        let max = templateparms.len();
        if given < required || given > max {
            return Err(Diagnostic::ArityMismatch {
                name: name.to_string(),
                given,
                min: required,
                max: Some(max),
            });
        }
    }
    Ok(())
}

enum ExplicitLookup {
    NotFound,
    UseNode(NodeId),
    Rejected,
}

/// Looks `tname` (and its typedef-reduced form) up locally in `scope`. A
/// hit that is itself a `template` node is an explicit specialization; a
/// hit carrying a `template` NodeRef attribute is a previously-recorded
/// instantiation symbol and is resolved through the duplicate/supersede
/// rule below.
fn explicit_specialization(
    tname: &str,
    primary: NodeId,
    scope: Option<ScopeId>,
    symname: Option<&str>,
    tree: &Tree,
    symbols: &SymbolTable,
    sink: &mut dyn DiagnosticSink,
) -> ExplicitLookup {
    let Some(scope) = scope else {
        return ExplicitLookup::NotFound;
    };
    let mut found = symbols.clookup_local(tname, scope);
    if found.is_none() {
        let rname = symbols.typedef_reduce(tname, Some(scope));
        if rname != tname {
            found = symbols.clookup_local(&rname, scope);
        }
    }
    let Some(found) = found else {
        return ExplicitLookup::NotFound;
    };

    if tree.get(found).node_type == NodeType::Template {
        return ExplicitLookup::UseNode(found);
    }

    if let Some(instance) = tree.get(found).get_node_ref("template") {
        let was_anonymous = !tree.get(found).get_bool("named_instantiation");
        if was_anonymous && symname.is_some() {
            // A named instantiation may supersede a prior anonymous one.
            return ExplicitLookup::NotFound;
        }
        if symname.is_none() {
            // An anonymous request against any prior instantiation (named
            // or anonymous) is silently ignored: no diagnostic, no instantiation.
            return ExplicitLookup::Rejected;
        }
        sink.report(Diagnostic::DuplicateInstantiation {
            name: tree.get(found).get_str("name").unwrap_or_default().to_string(),
            first_at: instance,
            second_at: primary,
        });
        return ExplicitLookup::Rejected;
    }

    sink.report(Diagnostic::NotATemplate {
        name: tname.to_string(),
        found_at: found,
    });
    ExplicitLookup::Rejected
}

/// Runs the partial-spec matcher over `templ`'s `partials` list,
/// restricted to candidates whose arity matches the instantiation.
fn select_partial(
    templ: NodeId,
    concrete_types: &[String],
    tree: &Tree,
    symbols: &SymbolTable,
    scope: Option<ScopeId>,
    sink: &mut dyn DiagnosticSink,
) -> Option<NodeId> {
    let partials = tree.get(templ).get_node_list("partials")?.clone();
    let mut candidates: Vec<(NodeId, Vec<i64>)> = Vec::new();
    for partial in partials {
        let Some(parms) = tree.get(partial).get_parms("partialparms") else {
            continue;
        };
        if parms.len() != concrete_types.len() {
            continue;
        }
        let candidate_types: Vec<String> = parms.iter().map(|p| p.ty.clone()).collect();
        if let Some(row) = partial_match::score_candidate(concrete_types, &candidate_types, symbols, scope) {
            candidates.push((partial, row));
        }
    }
    if candidates.is_empty() {
        return None;
    }
    let rows: Vec<Vec<i64>> = candidates.iter().map(|(_, r)| r.clone()).collect();
    let result = partial_match::select_best(&rows);
    let chosen_idx = result.chosen?;
    if !result.ambiguous_with.is_empty() {
        sink.report(Diagnostic::AmbiguousPartial {
            chosen: candidates[chosen_idx].0,
            ignored: result.ambiguous_with.iter().map(|&i| candidates[i].0).collect(),
        });
    }
    Some(candidates[chosen_idx].0)
}

/// Builds the symbol-table key a completed instantiation is registered
/// under (and that a later request for the same arguments looks up to
/// detect a duplicate): `name` plus the typedef-reduced, comma-joined
/// argument types, template-bracketed. Exposed so a caller can register
/// the clone it produces from a [`Locator::locate`] result under the same
/// key `locate` itself would probe.
pub fn instantiation_key(
    name: &str,
    instantiated_parms: &ParmList,
    symbols: &SymbolTable,
    scope: Option<ScopeId>,
) -> String {
    let reduced_types: Vec<String> = instantiated_parms
        .iter()
        .map(|p| symbols.typedef_reduce(&p.ty, scope))
        .collect();
    let mut tname = name.to_string();
    type_ops::add_template(&mut tname, &reduced_types.join(","));
    tname
}

pub struct Locator;

impl Locator {
    /// `instantiated_parms` is the already-prepared (via
    /// `arg_preparer::expand_template_parms`) argument list; the locator
    /// additionally typedef-reduces each type when building `tname`.
    pub fn locate(
        name: &str,
        instantiated_parms: &ParmList,
        symname: Option<&str>,
        tscope: Option<ScopeId>,
        tree: &mut Tree,
        symbols: &SymbolTable,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<NodeId> {
        let Some(primary) = symbols.clookup(name, tscope) else {
            sink.report(Diagnostic::TemplateNotFound { name: name.to_string() });
            return None;
        };
        if tree.get(primary).node_type != NodeType::Template {
            sink.report(Diagnostic::NotATemplate {
                name: name.to_string(),
                found_at: primary,
            });
            return None;
        }

        let primary_scope = symbols.scope_of(primary).or(tscope);
        let tname = instantiation_key(name, instantiated_parms, symbols, primary_scope);
        let reduced_types: Vec<String> = instantiated_parms
            .iter()
            .map(|p| symbols.typedef_reduce(&p.ty, primary_scope))
            .collect();

        match explicit_specialization(&tname, primary, primary_scope, symname, tree, symbols, sink) {
            ExplicitLookup::UseNode(found) => {
                tree.get_mut(found).set_bool("instantiate", true);
                return Some(found);
            }
            ExplicitLookup::Rejected => return None,
            ExplicitLookup::NotFound => {}
        }

        if is_function_template(tree, primary) {
            return Self::locate_function_template(primary, instantiated_parms.len(), tree, symbols, tscope, name, sink);
        }

        let chosen = select_partial(primary, &reduced_types, tree, symbols, primary_scope, sink).unwrap_or(primary);

        let templateparms = tree.get(primary).get_parms("templateparms").cloned().unwrap_or_default();
        if let Err(diag) = validate_class_arity(instantiated_parms.len(), &templateparms, name) {
            sink.report(diag);
            return None;
        }

        tree.get_mut(chosen).set_bool("instantiate", true);
        if let Some(symname) = symname {
            let node = tree.get_mut(chosen);
            node.set_bool("named_instantiation", true);
            node.set_str("name", symname);
        }
        Some(chosen)
    }

    /// Function templates never run partial-spec matching.
    /// Every symbol-table sibling whose non-variadic arity matches exactly
    /// is flagged; if none match, the search repeats accepting variadic
    /// templates whose minimum arity is satisfied.
    fn locate_function_template(
        primary: NodeId,
        given: usize,
        tree: &mut Tree,
        symbols: &SymbolTable,
        tscope: Option<ScopeId>,
        name: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<NodeId> {
        let siblings = symbols.overload_set(name, tscope);
        let siblings: Vec<NodeId> = if siblings.is_empty() { vec![primary] } else { siblings };

        let mut first_match = None;
        for &candidate in &siblings {
            let Some(parms) = tree.get(candidate).get_parms("templateparms") else {
                continue;
            };
            if !parms.variadic_tail() && parms.len() == given {
                tree.get_mut(candidate).set_bool("instantiate", true);
                first_match.get_or_insert(candidate);
            }
        }
        if let Some(found) = first_match {
            return Some(found);
        }

        for &candidate in &siblings {
            let Some(parms) = tree.get(candidate).get_parms("templateparms") else {
                continue;
            };
            if parms.variadic_tail() && given + 1 >= parms.len() {
                tree.get_mut(candidate).set_bool("instantiate", true);
                return Some(candidate);
            }
        }

        sink.report(Diagnostic::TemplateNotFound { name: name.to_string() });
        None
    }
}
