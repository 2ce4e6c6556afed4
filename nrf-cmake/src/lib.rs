//! nrf-cmake: nRF5 SDK Makefile → CMake project generator.
//!
//! Walks an SDK tree, pulls a fixed set of variables out of every project
//! `Makefile`, and writes an equivalent `CMakeLists.txt` beside it. A shared
//! cross-compilation toolchain file and a per-host tool paths file are
//! written at the SDK root.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use nrf_cmake::config::Config;
//! use nrf_cmake::writer::DurableWriter;
//!
//! let cfg = Config::default();
//! let mut writer = DurableWriter::new(cfg.writer.options());
//! let summary = nrf_cmake::translate_tree(Path::new("nRF5_SDK/examples"), &cfg, &mut writer)
//!     .unwrap();
//! println!("{} project files written", summary.generated);
//! ```

use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

pub mod config;
pub mod discover;
pub mod emit;
pub mod extract;
pub mod makefile;
pub mod model;
pub mod preflight;
pub mod script;
pub mod toolchain;
pub mod translate;
pub mod writer;

use config::Config;
use discover::{Select, Walker};
use emit::Outcome;
use preflight::RunConfig;
use toolchain::{ToolchainFiles, ToolchainRequest};
use writer::{DurableWriter, Replace};

/// Counts from one pass over a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Project files written.
    pub generated: usize,
    /// Makefiles that are not projects.
    pub ignored: usize,
    /// Project files left unwritten because the target stayed busy.
    pub busy: usize,
    /// Makefiles that failed with an I/O error.
    pub failed: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.busy == 0
    }
}

/// Translate every project Makefile under `root`.
///
/// Each Makefile is independent: a failure is logged and counted, and the
/// walk moves on to the next one.
pub fn translate_tree<R: Replace>(
    root: &Path,
    cfg: &Config,
    writer: &mut DurableWriter<R>,
) -> Result<Summary> {
    let walker = Walker::new(root)?.exclude(cfg.discovery.exclude.iter().cloned());
    info!(root = %walker.root().display(), "translating makefiles");

    let mut summary = Summary::default();
    for makefile in walker.files(Select::FileName(cfg.discovery.build_file.clone())) {
        let makefile = match makefile {
            Ok(path) => path,
            Err(e) => {
                error!("{e:#}");
                summary.failed += 1;
                continue;
            }
        };

        match emit::generate_project(&makefile, &cfg.output, writer) {
            Ok(Outcome::Generated(_)) => summary.generated += 1,
            Ok(Outcome::Ignored) => summary.ignored += 1,
            Ok(Outcome::NotSaved(_)) => summary.busy += 1,
            Err(e) => {
                error!(path = %makefile.display(), "{e:#}");
                summary.failed += 1;
            }
        }
    }

    info!(
        generated = summary.generated,
        ignored = summary.ignored,
        busy = summary.busy,
        failed = summary.failed,
        "translation finished"
    );
    Ok(summary)
}

/// Write the toolchain and host paths files for a resolved run.
pub fn generate_toolchain<R: Replace>(
    run: &RunConfig,
    writer: &mut DurableWriter<R>,
) -> Result<ToolchainFiles> {
    let request = ToolchainRequest {
        root: &run.root,
        toolset: &run.toolset,
        nrfjprog: run.nrfjprog.as_deref(),
        host: &run.host,
    };
    toolchain::generate_toolchain(&request, &run.config.output, &run.config.target, writer)
}

/// Directories under `root` holding headers, relative and sorted.
pub fn list_include_dirs(root: &Path, cfg: &Config) -> Result<Vec<String>> {
    let walker = Walker::new(root)?.exclude(cfg.discovery.exclude.iter().cloned());
    discover::include_dirs(&walker, &cfg.discovery.header_extensions)
}

/// Source files under `root`, relative and sorted.
pub fn list_sources(root: &Path, cfg: &Config) -> Result<Vec<String>> {
    let walker = Walker::new(root)?.exclude(cfg.discovery.exclude.iter().cloned());
    discover::source_files(&walker, &cfg.discovery.source_extensions)
}
