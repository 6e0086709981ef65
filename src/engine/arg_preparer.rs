//! Argument preparer — `expand_template_parms`.

use itertools::{EitherOrBoth, Itertools};

use crate::data::{Node, Parm, ParmList, ParmListExt, type_ops};

/// Expands `instantiated_parms` against `primary`'s `templateparms`: fills
/// in names/types from the primary, appends a defaulted suffix when the
/// primary isn't variadic, and resolves default-argument back-references.
pub fn expand_template_parms(instantiated_parms: &ParmList, primary: &Node) -> ParmList {
    let primary_parms = primary.get_parms("templateparms").cloned().unwrap_or_default();

    // Pairwise merge: every instantiated parm picks up its name (and, if
    // untyped, its type) from the primary parm in the same position.
    let mut output: ParmList = instantiated_parms
        .iter()
        .zip_longest(primary_parms.iter())
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(given, pp) => {
                let mut merged = given.clone();
                merged.name = pp.name.clone();
                if merged.ty.is_empty() {
                    merged.ty = pp.ty.clone();
                }
                Some(merged)
            }
            EitherOrBoth::Left(given) => Some(given.clone()),
            EitherOrBoth::Right(_) => None,
        })
        .collect();

    // Only the genuine trailing run of defaulted parameters gets filled in;
    // a required parameter the caller omitted is left missing rather than
    // fabricated, so arity validation downstream still sees the shortfall.
    if !primary_parms.variadic_tail() && output.len() < primary_parms.len() {
        for pp in &primary_parms[output.len()..] {
            if pp.value.is_none() {
                break;
            }
            let mut copy = pp.clone();
            copy.default = true;
            output.push(copy);
        }
    }

    expand_defaults(&mut output);
    output
}

/// For every parameter with a default value, replaces earlier parameters'
/// names inside that default with their own value (or type, if the
/// parameter has no value) — the C++ rule that a default argument may
/// reference earlier template parameters.
fn expand_defaults(parms: &mut ParmList) {
    let snapshot = parms.clone();
    for p in parms.iter_mut() {
        let Some(v) = p.value.clone() else { continue };
        let mut newv = v;
        for q in &snapshot {
            let Some(qname) = &q.name else { continue };
            let qval = q.value.clone().unwrap_or_else(|| q.ty.clone());
            newv = type_ops::identifier_replace(&newv, qname, &qval);
        }
        p.value = Some(newv);
    }
}
