//! Project emission: [`VariableTable`] → `CMakeLists.txt`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::config::OutputConfig;
use crate::extract::{self, Extraction};
use crate::model::{SetValue, VariableTable};
use crate::script::Script;
use crate::translate::make_to_cmake;
use crate::writer::{DurableWriter, Replace};

/// Section titles and the variables they declare, in output order.
const SECTIONS: &[(&str, &[&str])] = &[
    ("Project", &["PROJECT_NAME", "TARGETS"]),
    ("Paths", &["OUTPUT_DIRECTORY", "SDK_ROOT", "PROJ_DIR"]),
    ("Source files", &["SRC_FILES"]),
    ("Include directories", &["INC_FOLDERS"]),
    ("Libraries", &["LIB_FILES"]),
    ("Optimization", &["OPT"]),
    ("Compiler flags", &["CFLAGS", "CXXFLAGS", "ASMFLAGS"]),
    ("Linker flags", &["LDFLAGS"]),
];

/// Per-language flag variables and the CMake variable they feed.
const LANGUAGE_FLAGS: &[(&str, &str)] = &[
    ("CFLAGS", "CMAKE_C_FLAGS"),
    ("CXXFLAGS", "CMAKE_CXX_FLAGS"),
    ("ASMFLAGS", "CMAKE_ASM_FLAGS"),
];

/// What [`generate_project`] did with one Makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The project file was written.
    Generated(PathBuf),
    /// The Makefile does not define a project.
    Ignored,
    /// The project file was busy and the writer gave up.
    NotSaved(PathBuf),
}

impl Outcome {
    /// Whether a file was actually produced.
    pub fn produced(&self) -> bool {
        matches!(self, Outcome::Generated(_))
    }
}

/// Translate the Makefile at `makefile` into a project file beside it.
pub fn generate_project<R: Replace>(
    makefile: &Path,
    output: &OutputConfig,
    writer: &mut DurableWriter<R>,
) -> Result<Outcome> {
    let table = match extract::extract_file(makefile)? {
        Extraction::Qualifying(table) => table,
        Extraction::Ignored { .. } => return Ok(Outcome::Ignored),
    };

    let script = render_project(&table, &output.minimum_version);
    let target = project_path(makefile, &output.project_file);
    debug!(makefile = %makefile.display(), target = %target.display(), "rendering project");

    let outcome = writer.save(&script, &target)?;
    Ok(if outcome.saved {
        Outcome::Generated(target)
    } else {
        Outcome::NotSaved(target)
    })
}

/// Where the project file for `makefile` goes.
pub fn project_path(makefile: &Path, project_file: &str) -> PathBuf {
    makefile.with_file_name(project_file)
}

/// Render the full project script for a qualifying table.
pub fn render_project(table: &VariableTable, minimum_version: &str) -> Script {
    let mut script = Script::new(Some(minimum_version));

    for (title, names) in SECTIONS {
        let present: Vec<(&str, &str)> = names
            .iter()
            .filter_map(|name| table.get(name).map(|value| (*name, value)))
            .collect();
        let is_optimization = *title == "Optimization";
        if present.is_empty() && !is_optimization {
            continue;
        }

        script.line(format!("# {title}"));
        for (name, value) in present {
            let text = make_to_cmake(value);
            script.assign(
                name,
                SetValue::Raw {
                    text: &text,
                    quoted: text.is_empty(),
                },
            );
        }
        if is_optimization {
            script
                .line("# Uncomment to enable link time optimization:")
                .line("# set(OPT \"${OPT} -flto\")");
        }
        script.blank();
    }

    append_trailer(&mut script, table);
    script
}

fn append_trailer(script: &mut Script, table: &VariableTable) {
    script
        .line("project(${PROJECT_NAME} C CXX ASM)")
        .blank()
        .line("list(APPEND CFLAGS \"-undef\" \"-D__GNUC__\")");

    for (flags, cmake_var) in LANGUAGE_FLAGS {
        if !table.contains(flags) {
            continue;
        }
        script
            .line(format!("list(FILTER {flags} EXCLUDE REGEX mcpu)"))
            .line(format!("string(REPLACE \";\" \" \" {flags} \"${{{flags}}}\")"))
            .line(format!("set({cmake_var} \"${{{flags}}}\")"));
    }

    script
        .line("string(REPLACE \";\" \" \" LDFLAGS \"${LDFLAGS}\")")
        .line("set(CMAKE_EXE_LINKER_FLAGS \"${LDFLAGS}\")")
        .blank()
        .line("include_directories(${INC_FOLDERS})")
        .line("add_executable(${PROJECT_NAME} ${SRC_FILES})");

    if table.contains("LIB_FILES") {
        script.line("target_link_libraries(${PROJECT_NAME} ${LIB_FILES})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> VariableTable {
        let mut table = VariableTable::new();
        for (name, value) in pairs {
            table.insert(name, *value);
        }
        table
    }

    #[test]
    fn sections_follow_fixed_order() {
        let t = table(&[
            ("LDFLAGS", "-Wl,--gc-sections"),
            ("CFLAGS", "-DBOARD"),
            ("INC_FOLDERS", "$(SDK_ROOT)/inc"),
            ("SRC_FILES", "main.c"),
            ("PROJECT_NAME", "blinky"),
        ]);
        let text = render_project(&t, "3.7").into_string();
        let pos = |needle: &str| {
            text.find(needle)
                .unwrap_or_else(|| panic!("{needle} missing in:\n{text}"))
        };
        assert!(pos("set(PROJECT_NAME blinky)") < pos("set(SRC_FILES main.c)"));
        assert!(pos("set(SRC_FILES") < pos("set(INC_FOLDERS ${SDK_ROOT}/inc)"));
        assert!(pos("set(INC_FOLDERS") < pos("# set(OPT"));
        assert!(pos("# set(OPT") < pos("set(CFLAGS -DBOARD)"));
        assert!(pos("set(CFLAGS") < pos("set(LDFLAGS"));
        assert!(pos("set(LDFLAGS") < pos("project(${PROJECT_NAME}"));
        assert!(text.ends_with("add_executable(${PROJECT_NAME} ${SRC_FILES})\n"));
        assert!(!text.contains("# Libraries"));
        assert!(!text.contains("CMAKE_CXX_FLAGS"));
    }

    #[test]
    fn library_link_only_when_present() {
        let t = table(&[("LIB_FILES", "$(SDK_ROOT)/lib.a")]);
        let text = render_project(&t, "3.7").into_string();
        assert!(text.contains("set(LIB_FILES ${SDK_ROOT}/lib.a)"));
        assert!(text.contains("target_link_libraries(${PROJECT_NAME} ${LIB_FILES})"));
    }

    #[test]
    fn empty_values_are_quoted() {
        let t = table(&[("ASMFLAGS", "")]);
        let text = render_project(&t, "3.7").into_string();
        assert!(text.contains("set(ASMFLAGS \"\")"), "{text}");
    }
}
