//! A declarative JSON fixture format for `Tree` (a CLI supplement),
//! grounded in the round-trip-through-a-file facility `cordl` ships for
//! its own type graph (`generate::json`). Lets a scenario be authored as
//! a file instead of only via hand-written `Tree`-builder Rust code.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::data::Tree;

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::Io(e) => write!(f, "{e}"),
            FixtureError::Json(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<std::io::Error> for FixtureError {
    fn from(e: std::io::Error) -> Self {
        FixtureError::Io(e)
    }
}

impl From<serde_json::Error> for FixtureError {
    fn from(e: serde_json::Error) -> Self {
        FixtureError::Json(e)
    }
}

/// Node 0 of a loaded fixture is taken to be the primary template node for
/// whatever instantiation request the caller drives against it — the one
/// convention the fixture format imposes beyond "a valid `Tree`".
pub fn load_tree(path: &Path) -> Result<Tree, FixtureError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_tree(path: &Path, tree: &Tree) -> Result<(), FixtureError> {
    let raw = serde_json::to_string_pretty(tree)?;
    fs::write(path, raw)?;
    Ok(())
}
