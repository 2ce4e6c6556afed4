//! Intermediate model types, the bridge between Makefile parsing and CMake
//! emission.
//!
//! These types know nothing about either file format's text layout, which
//! keeps the extractor and the generators testable in isolation.

use std::collections::BTreeMap;
use std::path::Path;

/// Every variable name the translator understands. Assignments to any other
/// name are ignored.
pub const ALLOW_LIST: &[&str] = &[
    "PROJECT_NAME",
    "TARGETS",
    "OUTPUT_DIRECTORY",
    "SDK_ROOT",
    "PROJ_DIR",
    "SRC_FILES",
    "INC_FOLDERS",
    "LIB_FILES",
    "OPT",
    "CFLAGS",
    "CXXFLAGS",
    "ASMFLAGS",
    "LDFLAGS",
];

/// Names that must all be present for a Makefile to count as a project.
pub const REQUIRED: &[&str] = &["PROJECT_NAME", "SRC_FILES", "INC_FOLDERS", "CFLAGS", "LDFLAGS"];

/// Cheap textual marker checked before a full parse.
pub const ANCHOR: &str = "PROJECT_NAME";

/// The operator of a Makefile assignment.
///
/// Kept on the statement so callers can tell `+=` from `:=`; the extractor
/// currently treats all of them as a full replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Recursive,
    /// `:=` or `::=`
    Simple,
    /// `?=`
    Conditional,
    /// `+=`
    Append,
    /// `!=`
    Shell,
}

/// One top-level variable definition from a Makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub op: AssignOp,
    /// Raw, unexpanded value with continuations collapsed.
    pub value: String,
}

/// Allow-listed variables of one Makefile, last definition wins.
#[derive(Debug, Default, Clone)]
pub struct VariableTable {
    vars: BTreeMap<&'static str, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name` if `name` is allow-listed. Returns whether
    /// it was stored.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> bool {
        match ALLOW_LIST.iter().copied().find(|n| *n == name) {
            Some(key) => {
                self.vars.insert(key, value.into());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Required names absent from this table, in [`REQUIRED`] order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// Whether every name in [`REQUIRED`] is present.
    pub fn is_qualifying(&self) -> bool {
        self.missing_required().is_empty()
    }
}

/// A value for a CMake `set()` before it is rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValue<'a> {
    /// Emitted as-is, optionally quoted.
    Raw { text: &'a str, quoted: bool },
    /// A filesystem path; always rendered with forward slashes and quoted.
    Path(&'a Path),
}

impl SetValue<'_> {
    /// Resolve to the final text and whether it must be quoted.
    pub fn resolve(&self) -> (String, bool) {
        match self {
            SetValue::Raw { text, quoted } => (text.to_string(), *quoted),
            SetValue::Path(path) => (to_forward_slashes(path), true),
        }
    }
}

/// Render a path with `/` separators regardless of host.
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
