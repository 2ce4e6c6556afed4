//! Durable file replacement: temp file, backup, atomic rename, retry while
//! the target is held open elsewhere.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::script::Script;

/// The step that moves the finished temp file over the target.
pub trait Replace {
    fn replace(&mut self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Plain `rename(2)`, atomic on the same filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rename;

impl Replace for Rename {
    fn replace(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

/// Writer behaviour knobs.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Keep retrying while the target is busy. With `false` a single
    /// replace attempt is made.
    pub block_until_saved: bool,
    /// Pause between replace attempts.
    pub retry_interval: Duration,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            block_until_saved: true,
            retry_interval: Duration::from_secs(1),
        }
    }
}

/// What happened to one save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved: bool,
    /// Number of replace attempts made, including the successful one.
    pub attempts: u32,
}

/// Persists scripts with the temp + backup + replace protocol.
pub struct DurableWriter<R = Rename> {
    options: WriteOptions,
    replacer: R,
}

impl DurableWriter<Rename> {
    pub fn new(options: WriteOptions) -> Self {
        Self::with_replacer(options, Rename)
    }
}

impl<R: Replace> DurableWriter<R> {
    pub fn with_replacer(options: WriteOptions, replacer: R) -> Self {
        Self { options, replacer }
    }

    /// Save `script` to `target`. See [`DurableWriter::save_str`].
    pub fn save(&mut self, script: &Script, target: &Path) -> Result<SaveOutcome> {
        self.save_str(script.as_str(), target)
    }

    /// Write `contents` to `target` so readers never see a partial file.
    ///
    /// A busy target is retried, not reported as an error. `saved` is only
    /// false when single-attempt mode gave up on a busy target. Any other
    /// I/O failure is returned as `Err`.
    pub fn save_str(&mut self, contents: &str, target: &Path) -> Result<SaveOutcome> {
        let temp = sibling(target, ".tmp");
        let backup = sibling(target, ".bak");

        if let Err(e) = std::fs::write(&temp, contents) {
            std::fs::remove_file(&temp).ok();
            return Err(e).with_context(|| format!("writing temporary file {}", temp.display()));
        }

        match std::fs::copy(target, &backup) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                std::fs::remove_file(&temp).ok();
                return Err(e).with_context(|| format!("backing up {}", target.display()));
            }
        }

        let mut attempts = 0u32;
        let saved = loop {
            attempts += 1;
            match self.replacer.replace(&temp, target) {
                Ok(()) => break true,
                Err(e) if is_busy(&e) => {
                    warn!(
                        path = %target.display(),
                        attempt = attempts,
                        "cannot save file, it is probably open somewhere"
                    );
                    if !self.options.block_until_saved {
                        break false;
                    }
                }
                Err(e) => {
                    std::fs::remove_file(&temp).ok();
                    std::fs::remove_file(&backup).ok();
                    return Err(e).with_context(|| format!("replacing {}", target.display()));
                }
            }
            std::thread::sleep(self.options.retry_interval);
        };

        if !saved {
            std::fs::remove_file(&temp).ok();
        }
        remove_if_exists(&backup)?;

        if saved {
            info!(path = %target.display(), attempts, "saved file");
        } else {
            warn!(path = %target.display(), "could not save file");
        }

        Ok(SaveOutcome { saved, attempts })
    }
}

/// `target` with `suffix` appended to its file name.
pub fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn is_busy(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ResourceBusy
    )
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}
