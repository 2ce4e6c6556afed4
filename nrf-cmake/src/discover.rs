//! Directory traversal: locate Makefiles, headers and sources under a root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::{DirEntry, WalkDir};

use crate::model::to_forward_slashes;

/// Which files a walk yields.
#[derive(Debug, Clone)]
pub enum Select {
    /// Files whose name is exactly this.
    FileName(String),
    /// Files whose extension is one of these (without the dot).
    Extensions(Vec<String>),
}

impl Select {
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Select::FileName(name) => path.file_name().is_some_and(|n| n == name.as_str()),
            Select::Extensions(exts) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.iter().any(|x| x == e)),
        }
    }
}

/// A depth-first walk over `root` that never descends into excluded
/// directories.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    exclude: Vec<PathBuf>,
}

impl Walker {
    /// Walk `root`, made absolute.
    pub fn new(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("resolving root directory {}", root.display()))?;
        Ok(Self {
            root,
            exclude: Vec::new(),
        })
    }

    /// Skip directories whose path relative to the root starts with any of
    /// `prefixes` (compared component-wise).
    pub fn exclude<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.exclude.extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        match entry.path().strip_prefix(&self.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => {
                self.exclude.iter().any(|prefix| rel.starts_with(prefix))
            }
            _ => false,
        }
    }

    /// Lazily yield absolute paths of the selected files. Unreadable
    /// directories come through as errors.
    pub fn files(&self, select: Select) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !self.is_excluded(e))
            .filter_map(move |entry| match entry {
                Ok(e) if e.file_type().is_file() && select.matches(e.path()) => {
                    Some(Ok(e.into_path()))
                }
                Ok(_) => None,
                Err(e) => {
                    let at = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    Some(Err(anyhow::Error::new(e).context(format!("walking {at}"))))
                }
            })
    }

    /// `path` relative to the root, with forward slashes; `.` for the root.
    pub fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => to_forward_slashes(rel),
            Err(_) => to_forward_slashes(path),
        }
    }
}

/// Every directory holding at least one file with a header extension,
/// relative to the root and sorted.
pub fn include_dirs(walker: &Walker, header_extensions: &[String]) -> Result<Vec<String>> {
    let mut dirs = BTreeSet::new();
    for file in walker.files(Select::Extensions(header_extensions.to_vec())) {
        let file = file?;
        if let Some(parent) = file.parent() {
            dirs.insert(walker.relative(parent));
        }
    }
    Ok(dirs.into_iter().collect())
}

/// Every source file, relative to the root and sorted.
pub fn source_files(walker: &Walker, source_extensions: &[String]) -> Result<Vec<String>> {
    let mut files = walker
        .files(Select::Extensions(source_extensions.to_vec()))
        .map(|f| f.map(|f| walker.relative(&f)))
        .collect::<Result<Vec<_>>>()?;
    files.sort();
    Ok(files)
}
