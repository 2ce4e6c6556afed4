//! CLI entry point for nrf-cmake.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use nrf_cmake::preflight::{self, Inputs, RunConfig};
use nrf_cmake::writer::DurableWriter;
use tracing::error;

/// nrf-cmake: generate CMake projects and toolchain files for the nRF5 SDK.
#[derive(Parser, Debug)]
#[command(name = "nrf-cmake", version, about)]
struct Cli {
    /// Root directory of the nRF5 SDK (contains `components`, `external`, ...).
    root: PathBuf,

    /// Path to `arm-none-eabi-gcc`; g++, objcopy and size are expected next to it.
    #[arg(long)]
    gcc: PathBuf,

    /// Path to `nrfjprog`.
    #[arg(long)]
    nrfjprog: Option<PathBuf>,

    /// Path to an `nrf-cmake.toml` settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host identity used to name the tool paths file (defaults to the host name).
    #[arg(long)]
    host: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Toolchain)]
    mode: Mode,

    /// Subtree of the root translated in `translate` mode.
    #[arg(long, default_value = "examples")]
    subtree: PathBuf,

    /// Give up on busy files after one attempt instead of waiting.
    #[arg(long)]
    no_block: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Write the toolchain and host paths files.
    Toolchain,
    /// Write the toolchain files, then a CMakeLists.txt for every project Makefile.
    Translate,
    /// Print every directory containing headers.
    ListIncludeDirs,
    /// Print every source file.
    ListSources,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let fallback = if cli.verbose {
        "nrf_cmake=debug"
    } else {
        "nrf_cmake=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();

    let host = cli.host.clone().unwrap_or_else(default_host);
    let inputs = Inputs {
        root: &cli.root,
        gcc: &cli.gcc,
        nrfjprog: cli.nrfjprog.as_deref(),
        config: cli.config.as_deref(),
        host: &host,
    };
    let mut run = match preflight::resolve(&inputs) {
        Ok(run) => run,
        Err(e) => {
            error!("{e}");
            std::process::exit(e.exit_code());
        }
    };
    if cli.no_block {
        run.config.writer.block_until_saved = false;
    }

    match execute(&cli, &run) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli, run: &RunConfig) -> Result<bool> {
    let mut writer = DurableWriter::new(run.config.writer.options());
    match cli.mode {
        Mode::Toolchain => {
            nrf_cmake::generate_toolchain(run, &mut writer)?;
            Ok(true)
        }
        Mode::Translate => {
            nrf_cmake::generate_toolchain(run, &mut writer)?;
            let summary =
                nrf_cmake::translate_tree(&run.root.join(&cli.subtree), &run.config, &mut writer)?;
            Ok(summary.is_success())
        }
        Mode::ListIncludeDirs => {
            for dir in nrf_cmake::list_include_dirs(&run.root, &run.config)? {
                println!("{dir}");
            }
            Ok(true)
        }
        Mode::ListSources => {
            for file in nrf_cmake::list_sources(&run.root, &run.config)? {
                println!("{file}");
            }
            Ok(true)
        }
    }
}

/// The machine's host name as reported by the OS, the same value CMake's
/// `cmake_host_system_information(... HOSTNAME)` sees.
fn default_host() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
