use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;

const TMPDIR: &str = "TMPDIR";
const CLANG_MODULE_CACHE_PATH: &str = "CLANG_MODULE_CACHE_PATH";

/// Environment overrides that give engine processes a writable scratch area
///
/// The server's own environment is never modified; the overrides are applied
/// to each spawned engine command.
#[derive(Debug, Clone, Default)]
pub struct ScratchEnv {
    vars: Vec<(OsString, PathBuf)>,
    tmpdir: Option<PathBuf>,
}

impl ScratchEnv {
    /// Inspect `TMPDIR` and `CLANG_MODULE_CACHE_PATH`, falling back to
    /// directories under `fallback_root` when they are unset or unwritable
    pub fn prepare(fallback_root: &Path) -> Result<Self> {
        let mut vars = Vec::new();

        let tmpdir = match std::env::var_os(TMPDIR).map(PathBuf::from) {
            Some(path) if is_writable_dir(&path) => path,
            current => {
                let fallback = fallback_root.join("tmp");
                std::fs::create_dir_all(&fallback)?;
                tracing::debug!(
                    current = ?current,
                    fallback = %fallback.display(),
                    "TMPDIR unusable, using scratch directory"
                );
                vars.push((OsString::from(TMPDIR), fallback.clone()));
                fallback
            }
        };

        // Swift's clang integration writes module caches and fails on read-only homes
        match std::env::var_os(CLANG_MODULE_CACHE_PATH).map(PathBuf::from) {
            Some(path) if is_writable_dir(&path) => {}
            _ => {
                let cache = tmpdir.join("clang-module-cache");
                std::fs::create_dir_all(&cache)?;
                vars.push((OsString::from(CLANG_MODULE_CACHE_PATH), cache));
            }
        }

        Ok(Self {
            vars,
            tmpdir: Some(tmpdir),
        })
    }

    /// Variables to set on each engine process
    pub fn vars(&self) -> impl Iterator<Item = (&OsString, &PathBuf)> {
        self.vars.iter().map(|(k, v)| (k, v))
    }

    /// Temporary directory engine processes will see
    pub fn tmpdir(&self) -> Option<&Path> {
        self.tmpdir.as_deref()
    }
}

fn is_writable_dir(path: &Path) -> bool {
    path.is_dir() && tempfile::tempfile_in(path).is_ok()
}
