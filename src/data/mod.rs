pub mod node;
pub mod parm;
pub mod symbols;
pub mod tree;
pub mod type_ops;

pub use node::{Attr, Node, NodeType};
pub use parm::{Parm, ParmList, ParmListExt};
pub use symbols::{ScopeId, SymbolTable};
pub use tree::{NodeId, Tree};
