use super::type_ops;

/// A single template or function parameter. `ParmList` is modeled
/// as "a singly linked chain of parameter nodes (same Node type)"; a `Vec`
/// already gives ordered, indexable storage without the aliasing cost of a
/// hand-rolled linked list, so that's what's used here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "fixtures", derive(serde::Serialize, serde::Deserialize))]
pub struct Parm {
    pub name: Option<String>,
    pub ty: String,
    pub value: Option<String>,
    pub sym_name: Option<String>,
    pub default: bool,
}

impl Parm {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: ty.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_sym_name(mut self, sym_name: impl Into<String>) -> Self {
        self.sym_name = Some(sym_name.into());
        self
    }

    pub fn anonymous(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            ..Default::default()
        }
    }
}

pub type ParmList = Vec<Parm>;

/// Invariant: "a parameter is variadic iff it is the last
/// in its list."
pub trait ParmListExt {
    fn variadic_index(&self) -> Option<usize>;
    fn variadic_tail(&self) -> bool;
}

impl ParmListExt for ParmList {
    fn variadic_index(&self) -> Option<usize> {
        self.last()
            .filter(|p| type_ops::is_variadic(&p.ty))
            .map(|_| self.len() - 1)
    }

    fn variadic_tail(&self) -> bool {
        self.variadic_index().is_some()
    }
}
