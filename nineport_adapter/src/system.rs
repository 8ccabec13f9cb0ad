// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry points.

use std::sync::Arc;

use nineport_core::backend::BackendProvider;
use nineport_core::com::Com;
use nineport_core::error::{Error, Result};
use nineport_core::platform::Platform;

use crate::driver::ModuleLoader;
use crate::factory::{Direct3D9, Direct3D9Ex};
use crate::module::{DriverCache, LoaderConfig, ProbeTargets};
use crate::topology::Topology;

/// Everything the entry points need from the outside world.
#[derive(Clone)]
pub struct System {
    /// Window system and present extension.
    pub platform: Platform,
    /// Backend devices.
    pub backends: Arc<dyn BackendProvider>,
    /// Opens the vendor module.
    pub loader: Arc<dyn ModuleLoader>,
    /// Where to look for the vendor module.
    pub loader_config: LoaderConfig,
    /// Where the probe outcome is kept.
    pub cache: Arc<DriverCache>,
}

impl core::fmt::Debug for System {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("System")
            .field("platform", &self.platform)
            .field("loader_config", &self.loader_config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl System {
    /// A system using the environment's search path and the process-wide
    /// probe cache.
    #[must_use]
    pub fn new(
        platform: Platform,
        backends: Arc<dyn BackendProvider>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            platform,
            backends,
            loader,
            loader_config: LoaderConfig::from_env(),
            cache: DriverCache::process(),
        }
    }

    fn create(&self, ex: bool) -> Result<Direct3D9> {
        let targets = ProbeTargets {
            loader: self.loader.as_ref(),
            config: &self.loader_config,
            present: self.platform.present.as_ref(),
            backends: self.backends.as_ref(),
        };
        let Some(loaded) = self.cache.probe(&targets) else {
            log::error!("Your display driver doesn't support native D3D9 adapters.");
            return Err(Error::NotAvailable);
        };

        let topology = Topology::discover(
            self.platform.windows.as_ref(),
            self.backends.as_ref(),
            loaded.module.as_ref(),
        )?;
        Ok(Direct3D9::new(
            topology,
            self.platform.clone(),
            loaded.module.version(),
            ex,
        ))
    }
}

/// Creates a factory on the base interface.
///
/// Returns `None` when the video subsystem is not initialized or no adapter
/// is available; the reason is logged.
#[must_use]
pub fn direct3d_create9(system: &System) -> Option<Com<Direct3D9>> {
    if !system.platform.windows.video_initialized() {
        log::error!("Initialize the video subsystem before D3D9.");
        return None;
    }
    system.create(false).map(Com::new).ok()
}

/// Creates a factory on the extended interface.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] when the video subsystem is not initialized.
/// - [`Error::NotAvailable`] when no vendor module or adapter is usable.
/// - [`Error::OutOfResources`] when discovery runs out of memory.
pub fn direct3d_create9_ex(system: &System) -> Result<Direct3D9Ex> {
    if !system.platform.windows.video_initialized() {
        log::error!("Initialize the video subsystem before D3D9.");
        return Err(Error::InvalidArgument);
    }
    let base = Com::new(system.create(true)?);
    Direct3D9Ex::from_base(&base)
}
