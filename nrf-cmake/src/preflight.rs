//! Resolve command-line inputs into a validated [`RunConfig`].
//!
//! Everything the generators need is checked here, before anything is
//! written. Each failure carries its own process exit code.

use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::toolchain::Toolset;

/// A precondition that does not hold.
#[derive(thiserror::Error, Debug)]
pub enum PreflightError {
    #[error("root directory {} is not an SDK root: missing `{}`", .root.display(), .missing.display())]
    Root { root: PathBuf, missing: PathBuf },

    #[error("compiler tool {} is not executable", .path.display())]
    Compiler { path: PathBuf },

    #[error("compiler {} is not named like a gcc driver", .path.display())]
    CompilerName { path: PathBuf },

    #[error("flashing tool {} is not executable", .path.display())]
    FlashTool { path: PathBuf },

    #[error("config file {} is not usable: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

impl PreflightError {
    /// The process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PreflightError::Root { .. } => -1,
            PreflightError::Compiler { .. } | PreflightError::CompilerName { .. } => -2,
            PreflightError::FlashTool { .. } => -3,
            PreflightError::Config { .. } => -4,
        }
    }
}

/// Raw inputs, as given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    pub root: &'a Path,
    pub gcc: &'a Path,
    pub nrfjprog: Option<&'a Path>,
    pub config: Option<&'a Path>,
    pub host: &'a str,
}

/// Fully validated run configuration handed to the generators.
#[derive(Debug)]
pub struct RunConfig {
    /// Absolute SDK root.
    pub root: PathBuf,
    pub toolset: Toolset,
    pub nrfjprog: Option<PathBuf>,
    /// Sanitized host identity.
    pub host: String,
    pub config: Config,
}

/// Check every precondition and build the run configuration.
pub fn resolve(inputs: &Inputs<'_>) -> Result<RunConfig, PreflightError> {
    let config = match inputs.config {
        Some(path) => config::load_config(path).map_err(|e| PreflightError::Config {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?,
        None => Config::default(),
    };

    let root = inputs
        .root
        .canonicalize()
        .map_err(|_| PreflightError::Root {
            root: inputs.root.to_path_buf(),
            missing: PathBuf::from("."),
        })?;
    if let Some(missing) = config
        .sdk
        .required_subdirs
        .iter()
        .find(|sub| !root.join(sub).is_dir())
    {
        return Err(PreflightError::Root {
            root,
            missing: missing.clone(),
        });
    }

    let gcc = absolute_tool(inputs.gcc).ok_or_else(|| PreflightError::Compiler {
        path: inputs.gcc.to_path_buf(),
    })?;
    let toolset = Toolset::from_gcc(&gcc).ok_or_else(|| PreflightError::CompilerName {
        path: inputs.gcc.to_path_buf(),
    })?;
    for (_, tool) in toolset.entries() {
        if !is_executable(tool) {
            return Err(PreflightError::Compiler {
                path: tool.to_path_buf(),
            });
        }
    }

    let nrfjprog = match inputs.nrfjprog {
        Some(tool) => match absolute_tool(tool) {
            Some(path) if is_executable(&path) => Some(path),
            _ => {
                return Err(PreflightError::FlashTool {
                    path: tool.to_path_buf(),
                });
            }
        },
        None => None,
    };

    Ok(RunConfig {
        root,
        toolset,
        nrfjprog,
        host: sanitize_host(inputs.host),
        config,
    })
}

/// `path` with its directory canonicalized. The file name is kept as given
/// so a symlinked `arm-none-eabi-gcc` still yields its siblings by name.
/// `None` if the directory does not exist.
fn absolute_tool(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Some(dir.canonicalize().ok()?.join(name))
}

/// Whether `path` is a file this user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// CMake regex for the characters [`sanitize_host`] replaces. The toolchain
/// file applies it to CMake's own host name so both sides agree.
pub const HOST_REJECT: &str = "[^A-Za-z0-9_-]";

/// Host identity used when nothing is left after sanitizing.
pub const UNKNOWN_HOST: &str = "unknown";

/// Make a host name safe to embed in a file name.
pub fn sanitize_host(host: &str) -> String {
    let clean: String = host
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if clean.is_empty() {
        UNKNOWN_HOST.to_string()
    } else {
        clean
    }
}
