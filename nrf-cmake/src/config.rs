//! Configuration types for `nrf-cmake.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::writer::WriteOptions;

/// Root configuration. Every table is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sdk: SdkConfig,
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
    pub writer: WriterConfig,
    pub target: TargetConfig,
}

/// Sanity checks on the SDK root.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SdkConfig {
    /// Subdirectories the root must contain.
    pub required_subdirs: Vec<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            required_subdirs: vec![PathBuf::from("components"), PathBuf::from("external")],
        }
    }
}

/// Tree traversal settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Exact name of the Makefiles to translate.
    pub build_file: String,
    /// Directory prefixes, relative to the walked root, never descended into.
    pub exclude: Vec<PathBuf>,
    pub header_extensions: Vec<String>,
    pub source_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            build_file: "Makefile".to_string(),
            exclude: [".git", ".idea", ".vscode", "_build", "build"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            header_extensions: vec!["h".to_string()],
            source_extensions: ["c", "s", "S"].into_iter().map(String::from).collect(),
        }
    }
}

/// Names of generated files.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Written next to every qualifying Makefile.
    pub project_file: String,
    /// Host-independent toolchain file at the root.
    pub toolchain_file: String,
    /// The host-keyed paths file is `<stem>-<host>.cmake`.
    pub paths_file_stem: String,
    pub minimum_version: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            project_file: "CMakeLists.txt".to_string(),
            toolchain_file: "arm-gcc-toolchain.cmake".to_string(),
            paths_file_stem: "nrf5-paths".to_string(),
            minimum_version: "3.7".to_string(),
        }
    }
}

/// Durable writer settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    pub block_until_saved: bool,
    pub retry_interval_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            block_until_saved: true,
            retry_interval_ms: 1000,
        }
    }
}

impl WriterConfig {
    pub fn options(&self) -> WriteOptions {
        WriteOptions {
            block_until_saved: self.block_until_saved,
            retry_interval: Duration::from_millis(self.retry_interval_ms),
        }
    }
}

/// Cross-compilation target identity.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// `CMAKE_SYSTEM_PROCESSOR`.
    pub processor: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            processor: "arm".to_string(),
        }
    }
}

/// Load and parse a `nrf-cmake.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    parse_config(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.discovery.build_file, "Makefile");
        assert_eq!(cfg.output.project_file, "CMakeLists.txt");
        assert!(cfg.writer.block_until_saved);
        assert_eq!(cfg.writer.options().retry_interval, Duration::from_secs(1));
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = parse_config(
            "[discovery]\nexclude = [\"legacy\"]\n\n[writer]\nblock_until_saved = false\n",
        )
        .unwrap();
        assert_eq!(cfg.discovery.exclude, vec![PathBuf::from("legacy")]);
        assert_eq!(cfg.discovery.build_file, "Makefile");
        assert!(!cfg.writer.block_until_saved);
        assert_eq!(cfg.writer.retry_interval_ms, 1000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[output]\nprojectfile = \"x\"\n").is_err());
    }
}
