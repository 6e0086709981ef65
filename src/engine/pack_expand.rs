//! Pack expander — `expand_variadic_parms`.

use crate::data::{Parm, ParmList, ParmListExt, type_ops};

/// If `parms` ends in a variadic parameter, replaces that trailing
/// parameter with one substituted parameter per element of `pack` (the
/// concrete arguments bound to `pack_formal`, the template's declared pack
/// parameter name). Parameters before the variadic tail are left
/// untouched. No-op if `parms` has no variadic tail.
pub fn expand_variadic_parms(parms: &ParmList, pack_formal: &str, pack: &[Parm]) -> ParmList {
    let Some(variadic_index) = parms.variadic_index() else {
        return parms.clone();
    };
    let variadic = &parms[variadic_index];
    let mut expanded: ParmList = parms[..variadic_index].to_vec();

    for element in pack {
        let newtype = type_ops::del_variadic(&variadic.ty);
        let newtype = type_ops::identifier_replace(&newtype, pack_formal, &element.ty);
        expanded.push(Parm {
            name: None,
            ty: newtype,
            value: None,
            sym_name: None,
            default: false,
        });
    }
    expanded
}
