//! Extraction: Makefile text → [`VariableTable`].

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::makefile;
use crate::model::{ANCHOR, Assignment, VariableTable};

/// Result of extracting one Makefile.
#[derive(Debug)]
pub enum Extraction {
    /// Every required variable is present.
    Qualifying(VariableTable),
    /// The file is not a project Makefile. `missing` lists the absent
    /// required names; it is empty when the anchor pre-check rejected the
    /// file before parsing.
    Ignored { missing: Vec<&'static str> },
}

/// Collect allow-listed assignments into a table. A repeated name keeps the
/// value of its last assignment, whatever the operator.
pub fn collect_variables<'a>(statements: impl IntoIterator<Item = &'a Assignment>) -> VariableTable {
    let mut table = VariableTable::new();
    for statement in statements {
        if table.insert(&statement.name, statement.value.as_str()) {
            debug!(name = %statement.name, op = ?statement.op, "captured variable");
        }
    }
    table
}

/// Run the anchor pre-check, parse `source`, build the table, and gate on
/// the required set.
pub fn extract_source(source: &str) -> Extraction {
    if !source.contains(ANCHOR) {
        return Extraction::Ignored {
            missing: Vec::new(),
        };
    }

    let statements = makefile::parse(source);
    let table = collect_variables(&statements);
    let missing = table.missing_required();
    if missing.is_empty() {
        Extraction::Qualifying(table)
    } else {
        Extraction::Ignored { missing }
    }
}

/// Read `path` and extract it, logging rejected files as ignored.
pub fn extract_file(path: &Path) -> Result<Extraction> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading makefile {}", path.display()))?;

    let extraction = extract_source(&source);
    if let Extraction::Ignored { missing } = &extraction {
        info!(path = %path.display(), missing = ?missing, "ignored");
    }
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "PROJECT_NAME := app\nSRC_FILES := main.c\nINC_FOLDERS := .\n\
                           CFLAGS := -Wall\nLDFLAGS := -Wl,--gc-sections\n";

    #[test]
    fn later_assignment_wins() {
        let src = format!("{MINIMAL}CFLAGS += -DFIRST\nCFLAGS += -DSECOND\n");
        let Extraction::Qualifying(table) = extract_source(&src) else {
            panic!("expected a qualifying file");
        };
        assert_eq!(table.get("CFLAGS"), Some("-DSECOND"));
    }

    #[test]
    fn unlisted_names_are_dropped() {
        let src = format!("{MINIMAL}GNU_PREFIX := arm-none-eabi\n");
        let Extraction::Qualifying(table) = extract_source(&src) else {
            panic!("expected a qualifying file");
        };
        assert_eq!(table.len(), 5);
        assert!(!table.contains("GNU_PREFIX"));
    }

    #[test]
    fn missing_required_names_are_reported() {
        match extract_source("PROJECT_NAME := app\nCFLAGS := -O2\n") {
            Extraction::Ignored { missing } => {
                assert_eq!(missing, vec!["SRC_FILES", "INC_FOLDERS", "LDFLAGS"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn anchor_precheck_matches_full_parse() {
        let without_anchor = "SRC_FILES := a.c\nINC_FOLDERS := .\nCFLAGS := x\nLDFLAGS := y\n";
        assert!(matches!(
            extract_source(without_anchor),
            Extraction::Ignored { missing } if missing.is_empty()
        ));
        let table = collect_variables(&makefile::parse(without_anchor));
        assert!(!table.is_qualifying());
    }
}
