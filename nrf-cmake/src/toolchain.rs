//! Toolchain emission: the host-keyed tool paths file and the shared
//! cross-compilation toolchain file.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::info;

use crate::config::{OutputConfig, TargetConfig};
use crate::model::SetValue;
use crate::preflight::{HOST_REJECT, UNKNOWN_HOST};
use crate::script::Script;
use crate::writer::{DurableWriter, Replace};

/// The GCC cross toolchain executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolset {
    pub gcc: PathBuf,
    pub gxx: PathBuf,
    pub objcopy: PathBuf,
    pub size: PathBuf,
}

impl Toolset {
    /// Derive the sibling tools from the C compiler path by replacing the
    /// last `gcc` in its file name, e.g. `arm-none-eabi-gcc.exe` →
    /// `arm-none-eabi-objcopy.exe`. `None` if the name has no `gcc`.
    pub fn from_gcc(gcc: &Path) -> Option<Self> {
        let name = gcc.file_name()?.to_str()?;
        let at = name.rfind("gcc")?;
        let sibling = |tool: &str| {
            gcc.with_file_name(format!("{}{tool}{}", &name[..at], &name[at + 3..]))
        };
        Some(Self {
            gcc: gcc.to_path_buf(),
            gxx: sibling("g++"),
            objcopy: sibling("objcopy"),
            size: sibling("size"),
        })
    }

    /// All executables with the CMake variable each is published under.
    pub fn entries(&self) -> [(&'static str, &Path); 4] {
        [
            ("ARM_GCC_C", self.gcc.as_path()),
            ("ARM_GCC_CXX", self.gxx.as_path()),
            ("ARM_GCC_OBJCOPY", self.objcopy.as_path()),
            ("ARM_GCC_SIZE", self.size.as_path()),
        ]
    }
}

/// Inputs of one toolchain generation.
#[derive(Debug, Clone, Copy)]
pub struct ToolchainRequest<'a> {
    /// SDK root; both files are written here.
    pub root: &'a Path,
    pub toolset: &'a Toolset,
    /// Flashing tool, if any.
    pub nrfjprog: Option<&'a Path>,
    /// Identity of this machine, already sanitized.
    pub host: &'a str,
}

/// Paths of the two files written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainFiles {
    pub paths_file: PathBuf,
    pub toolchain_file: PathBuf,
}

/// `<stem>-<host>.cmake`
pub fn paths_file_name(stem: &str, host: &str) -> String {
    format!("{stem}-{host}.cmake")
}

/// Write the paths file for `request.host` and the shared toolchain file.
/// Other hosts' paths files are left alone.
pub fn generate_toolchain<R: Replace>(
    request: &ToolchainRequest<'_>,
    output: &OutputConfig,
    target: &TargetConfig,
    writer: &mut DurableWriter<R>,
) -> Result<ToolchainFiles> {
    let paths_file = request
        .root
        .join(paths_file_name(&output.paths_file_stem, request.host));
    let toolchain_file = request.root.join(&output.toolchain_file);

    for (script, path) in [
        (render_paths(request), &paths_file),
        (render_toolchain(output, target), &toolchain_file),
    ] {
        if !writer.save(&script, path)?.saved {
            bail!("could not save {}: file is busy", path.display());
        }
    }

    info!(
        host = request.host,
        paths = %paths_file.display(),
        toolchain = %toolchain_file.display(),
        "toolchain files generated"
    );

    Ok(ToolchainFiles {
        paths_file,
        toolchain_file,
    })
}

/// The machine-local absolute paths.
pub fn render_paths(request: &ToolchainRequest<'_>) -> Script {
    let mut script = Script::new(None);
    script.line(format!("# Tool locations for host `{}`.", request.host));

    script.assign("NRF5_SDK_ROOT", SetValue::Path(request.root));
    for (name, path) in request.toolset.entries() {
        script.assign(name, SetValue::Path(path));
    }
    if let Some(nrfjprog) = request.nrfjprog {
        script.assign("NRFJPROG", SetValue::Path(nrfjprog));
    }
    script
}

/// The host-independent toolchain declaration.
pub fn render_toolchain(output: &OutputConfig, target: &TargetConfig) -> Script {
    let mut script = Script::new(Some(output.minimum_version.as_str()));
    script
        .line("# Cross compilation toolchain. Pass it with -DCMAKE_TOOLCHAIN_FILE.")
        .blank()
        .line("get_property(_nrf5_languages GLOBAL PROPERTY ENABLED_LANGUAGES)")
        .line("if(_nrf5_languages)")
        .line(
            "    message(FATAL_ERROR \"The toolchain file must be applied before project() \
             or enable_language()\")",
        )
        .line("endif()")
        .blank()
        .set("CMAKE_SYSTEM_NAME", "Generic", false)
        .set("CMAKE_SYSTEM_PROCESSOR", &target.processor, false)
        .blank()
        .line("if(NOT DEFINED NRF5_HOST)")
        .line("    cmake_host_system_information(RESULT NRF5_HOST QUERY HOSTNAME)")
        .line("endif()")
        .line("string(STRIP \"${NRF5_HOST}\" NRF5_HOST)")
        .line(format!(
            "string(REGEX REPLACE \"{HOST_REJECT}\" \"_\" NRF5_HOST \"${{NRF5_HOST}}\")"
        ))
        .line("if(NRF5_HOST STREQUAL \"\")")
        .line(format!("    set(NRF5_HOST {UNKNOWN_HOST})"))
        .line("endif()")
        .line("list(APPEND CMAKE_TRY_COMPILE_PLATFORM_VARIABLES NRF5_HOST)")
        .set(
            "NRF5_PATHS_FILE",
            &format!(
                "${{CMAKE_CURRENT_LIST_DIR}}/{}",
                paths_file_name(&output.paths_file_stem, "${NRF5_HOST}")
            ),
            true,
        )
        .line("if(NOT EXISTS \"${NRF5_PATHS_FILE}\")")
        .line(
            "    message(FATAL_ERROR \"No tool paths for host ${NRF5_HOST}; \
             run nrf-cmake on this machine to create ${NRF5_PATHS_FILE}\")",
        )
        .line("endif()")
        .line("include(\"${NRF5_PATHS_FILE}\")")
        .blank()
        .set("CMAKE_C_COMPILER", "${ARM_GCC_C}", true)
        .set("CMAKE_CXX_COMPILER", "${ARM_GCC_CXX}", true)
        .set("CMAKE_ASM_COMPILER", "${ARM_GCC_C}", true)
        .set("CMAKE_OBJCOPY", "${ARM_GCC_OBJCOPY}", true)
        .set("CMAKE_SIZE", "${ARM_GCC_SIZE}", true)
        .set("CMAKE_TRY_COMPILE_TARGET_TYPE", "STATIC_LIBRARY", false)
        .blank()
        .set("CMAKE_FIND_ROOT_PATH", "${NRF5_SDK_ROOT}", true)
        .set("CMAKE_FIND_ROOT_PATH_MODE_PROGRAM", "NEVER", false)
        .set("CMAKE_FIND_ROOT_PATH_MODE_LIBRARY", "ONLY", false)
        .set("CMAKE_FIND_ROOT_PATH_MODE_INCLUDE", "ONLY", false)
        .set("CMAKE_FIND_ROOT_PATH_MODE_PACKAGE", "ONLY", false);
    script
}
