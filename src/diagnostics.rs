//! The typed diagnostic surface, described elsewhere only in
//! prose ("each carries a source location captured from the node or the
//! calling parser"). `NodeId` stands in for that location since this crate
//! has no file/line of its own; a host driver maps it back through its own
//! AST-to-source table.

use std::fmt;

use crate::data::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    TemplateNotFound {
        name: String,
    },
    NotATemplate {
        name: String,
        found_at: NodeId,
    },
    ArityMismatch {
        name: String,
        given: usize,
        min: usize,
        max: Option<usize>,
    },
    DuplicateInstantiation {
        name: String,
        first_at: NodeId,
        second_at: NodeId,
    },
    AmbiguousPartial {
        chosen: NodeId,
        ignored: Vec<NodeId>,
    },
}

impl Diagnostic {
    /// Fatal diagnostics short-circuit `locate`/`expand` before any
    /// mutation; the two warnings mutate the sink only and processing
    /// continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Diagnostic::TemplateNotFound { .. }
                | Diagnostic::NotATemplate { .. }
                | Diagnostic::ArityMismatch { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TemplateNotFound { name } => {
                write!(f, "Template '{name}' undefined.")
            }
            Diagnostic::NotATemplate { name, found_at } => {
                write!(f, "'{name}' (node {found_at}) is not a template.")
            }
            Diagnostic::ArityMismatch {
                name,
                given,
                min,
                max,
            } => match max {
                Some(max) => write!(
                    f,
                    "Template '{name}' expects {min}..={max} arguments, got {given}."
                ),
                None => write!(
                    f,
                    "Template '{name}' expects at least {min} arguments, got {given}."
                ),
            },
            Diagnostic::DuplicateInstantiation {
                name,
                first_at,
                second_at,
            } => write!(
                f,
                "Redefinition of '{name}': first instantiated at node {first_at}, again at {second_at}."
            ),
            Diagnostic::AmbiguousPartial { chosen, ignored } => write!(
                f,
                "Ambiguous partial specialization: chose node {chosen}, ignoring {ignored:?}."
            ),
        }
    }
}

/// A diagnostic either gets collected for the caller to inspect, or
/// forwarded straight to logging — this trait lets `locate`/`expand` stay
/// agnostic to which.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards to `log` by severity instead of collecting, for the CLI.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl DiagnosticSink for LoggingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_fatal() {
            log::error!("{diagnostic}");
        } else {
            log::warn!("{diagnostic}");
        }
    }
}
