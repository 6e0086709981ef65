pub mod arg_preparer;
pub mod expand;
pub mod locator;
pub mod pack_expand;
pub mod partial_match;
pub mod post_process;
pub mod substitute;
pub mod walker;

pub use expand::template_expand;
pub use locator::Locator;
