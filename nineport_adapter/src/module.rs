// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vendor module search and the once-per-process probe.
//!
//! The module is looked up along a colon-separated search path. An entry
//! naming a directory gets [`MODULE_FILE_NAME`] appended; any other entry is
//! tried as a file path. The first entry that loads wins.
//!
//! Probing (load, version check, present extension check, backend probe)
//! happens at most once per [`DriverCache`]. The outcome is kept, failure
//! included, and handed to every later caller.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use nineport_core::backend::BackendProvider;
use nineport_core::error::PlatformError;
use nineport_core::present::PresentExtension;
use rustix::fs::FileType;

use crate::driver::{DriverModule, ModuleLoader};

/// File name of the vendor module.
pub const MODULE_FILE_NAME: &str = "d3dadapter9.so.1";

/// Environment variable overriding the search path.
pub const MODULE_PATH_VAR: &str = "D3D_MODULE_PATH";

/// Search path used when the environment does not set one.
pub const DEFAULT_SEARCH_PATH: &str = concat!(
    "/usr/lib/x86_64-linux-gnu/d3d:",
    "/usr/lib/i386-linux-gnu/d3d:",
    "/usr/lib64/d3d:",
    "/usr/lib/d3d:",
    "/usr/lib32/d3d:",
    "/usr/lib/x86_64-linux-gnu/GL/lib/d3d:",
    "/usr/lib/i386-linux-gnu/GL/lib/d3d",
);

/// Present extension version the module requires.
const REQUIRED_PRESENT_VERSION: (u32, u32) = (1, 0);

/// Where to look for the vendor module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Colon-separated directories or file paths.
    pub search_path: Cow<'static, str>,
    /// `true` when the path came from [`MODULE_PATH_VAR`].
    pub from_env: bool,
}

impl LoaderConfig {
    /// The compiled-in search path.
    pub const SYSTEM: Self = Self {
        search_path: Cow::Borrowed(DEFAULT_SEARCH_PATH),
        from_env: false,
    };

    /// The compiled-in search path.
    #[must_use]
    pub const fn system() -> Self {
        Self::SYSTEM
    }

    /// [`MODULE_PATH_VAR`] if set, else the compiled-in search path.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var_os(MODULE_PATH_VAR) {
            Some(value) => match value.into_string() {
                Ok(value) => Self::with_override(Some(value)),
                Err(value) => {
                    log::warn!("Ignoring non-UTF-8 {MODULE_PATH_VAR}={value:?}");
                    Self::system()
                }
            },
            None => Self::system(),
        }
    }

    /// `search_path` if given, else the compiled-in search path.
    #[must_use]
    pub fn with_override(search_path: Option<String>) -> Self {
        match search_path {
            Some(search_path) => Self {
                search_path: Cow::Owned(search_path),
                from_env: true,
            },
            None => Self::system(),
        }
    }

    /// Paths to try, in order.
    #[must_use]
    pub fn candidates(&self) -> Vec<PathBuf> {
        self.search_path
            .split(':')
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let path = PathBuf::from(entry);
                if is_directory(&path) {
                    path.join(MODULE_FILE_NAME)
                } else {
                    path
                }
            })
            .collect()
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::SYSTEM
    }
}

fn is_directory(path: &Path) -> bool {
    rustix::fs::stat(path).is_ok_and(|stat| FileType::from_raw_mode(stat.st_mode).is_dir())
}

/// A module that loaded.
#[derive(Clone, Debug)]
pub struct LoadedModule {
    /// Path the module was loaded from.
    pub path: PathBuf,
    /// The module.
    pub module: Arc<dyn DriverModule>,
}

/// Tries every candidate of `config` and returns the first that loads.
///
/// # Errors
///
/// The last loader error when nothing loads.
pub fn load_module(
    loader: &dyn ModuleLoader,
    config: &LoaderConfig,
) -> Result<LoadedModule, PlatformError> {
    let mut last_error = PlatformError::new("empty module search path");
    for path in config.candidates() {
        log::trace!("Trying to load '{}'", path.display());
        match loader.open(&path) {
            Ok(module) => {
                log::trace!("Loaded '{}'", path.display());
                return Ok(LoadedModule { path, module });
            }
            Err(err) => {
                log::trace!("Failed to load '{}': {err}", path.display());
                last_error = err;
            }
        }
    }

    if config.from_env {
        log::error!(
            "Failed to load {MODULE_FILE_NAME} set by {MODULE_PATH_VAR} ({})",
            config.search_path
        );
    } else {
        log::error!(
            "{MODULE_FILE_NAME} was not found on your system. \
             Setting the envvar {MODULE_PATH_VAR} is required"
        );
    }
    Err(last_error)
}

/// The external collaborators a probe checks.
#[derive(Clone, Copy)]
pub struct ProbeTargets<'a> {
    /// Opens the module.
    pub loader: &'a dyn ModuleLoader,
    /// Where to look.
    pub config: &'a LoaderConfig,
    /// Must speak present 1.0.
    pub present: &'a dyn PresentExtension,
    /// Must report an available backend.
    pub backends: &'a dyn BackendProvider,
}

impl core::fmt::Debug for ProbeTargets<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProbeTargets")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The cached outcome of probing for a vendor module.
#[derive(Debug, Default)]
pub struct DriverCache {
    outcome: OnceLock<Option<LoadedModule>>,
}

static PROCESS_CACHE: OnceLock<Arc<DriverCache>> = OnceLock::new();

impl DriverCache {
    /// An empty cache; the first [`probe`](Self::probe) fills it.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
        }
    }

    /// The cache shared by the whole process.
    #[must_use]
    pub fn process() -> Arc<Self> {
        Arc::clone(PROCESS_CACHE.get_or_init(|| Arc::new(Self::new())))
    }

    /// Whether a probe already ran.
    #[must_use]
    pub fn attempted(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Returns the module if the probe succeeded, running it on first use.
    ///
    /// Later calls return the cached outcome without touching `targets`.
    pub fn probe(&self, targets: &ProbeTargets<'_>) -> Option<&LoadedModule> {
        self.outcome.get_or_init(|| run_probe(targets)).as_ref()
    }
}

fn run_probe(targets: &ProbeTargets<'_>) -> Option<LoadedModule> {
    let loaded = load_module(targets.loader, targets.config).ok()?;

    let (major, minor) = loaded.module.version();
    if major != 0 {
        log::error!(
            "Version mismatch. {} has {major}.{minor}, was expecting 0.x",
            loaded.path.display()
        );
        return None;
    }
    log::trace!("d3dadapter9 version: {major}.{minor}");

    let (present_major, present_minor) = REQUIRED_PRESENT_VERSION;
    if !targets.present.check_extension(present_major, present_minor) {
        log::error!("Unable to query PRESENT.");
        return None;
    }

    if !targets.backends.probe() {
        log::error!("No available backends.");
        return None;
    }

    Some(loaded)
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::path::PathBuf;

    use super::{DEFAULT_SEARCH_PATH, LoaderConfig, MODULE_FILE_NAME};

    #[test]
    fn default_path_lists_seven_directories() {
        let config = LoaderConfig::system();
        assert!(!config.from_env);
        assert_eq!(config.search_path.split(':').count(), 7);
        assert_eq!(config.search_path, DEFAULT_SEARCH_PATH);
    }

    #[test]
    fn override_replaces_default() {
        let config = LoaderConfig::with_override(Some("/opt/d3d".to_owned()));
        assert!(config.from_env);
        assert_eq!(config.search_path, Cow::<str>::Borrowed("/opt/d3d"));
        assert_eq!(LoaderConfig::with_override(None), LoaderConfig::SYSTEM);
    }

    #[test]
    fn directories_get_module_name_appended() {
        let config = LoaderConfig::with_override(Some(
            "/:/nonexistent/nineport/custom.so::/nonexistent/dir".to_owned(),
        ));
        assert_eq!(
            config.candidates(),
            vec![
                PathBuf::from("/").join(MODULE_FILE_NAME),
                PathBuf::from("/nonexistent/nineport/custom.so"),
                PathBuf::from("/nonexistent/dir"),
            ]
        );
    }
}
