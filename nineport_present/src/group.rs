// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation groups.
//!
//! A group owns one surface per head of the adapter group it was created
//! for. The present protocol version is negotiated once, when the group is
//! built, and shared by every surface in it.

use std::sync::Arc;

use nineport_core::backend::Backend;
use nineport_core::com::{Com, Iid, Unknown};
use nineport_core::error::{Error, Result};
use nineport_core::mode::ModeDesc;
use nineport_core::params::{BehaviorFlags, PresentParameters};
use nineport_core::platform::Platform;
use nineport_core::window::WindowId;

use crate::surface::{PresentSurface, SurfaceSetup};
use crate::version::PresentVersion;

/// Settings for building a [`PresentGroup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupConfig {
    /// Focus window passed to device creation.
    pub focus: Option<WindowId>,
    /// Created through the extended factory interface.
    pub ex: bool,
    /// Device behavior flags.
    pub behavior: BehaviorFlags,
    /// `major.minor` of the vendor module.
    pub driver_version: (u32, u32),
}

/// One presentation surface per head, plus any additional swap chains.
pub struct PresentGroup {
    setup: SurfaceSetup,
    surfaces: Vec<Com<PresentSurface>>,
}

impl core::fmt::Debug for PresentGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PresentGroup")
            .field("version", &self.setup.version)
            .field("ex", &self.setup.ex)
            .field("surfaces", &self.surfaces)
            .finish_non_exhaustive()
    }
}

impl PresentGroup {
    /// Builds a group with one surface per entry of `params`.
    ///
    /// `modes`, when given, holds one fullscreen mode per head. Resolved
    /// parameters are written back into `params`. If any surface fails the
    /// ones already built are torn down and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty `params`, a `modes` slice of
    ///   a different length, or a surface that cannot resolve its window.
    /// - [`Error::OutOfResources`] when the surface list cannot be allocated.
    /// - [`Error::DriverInternal`] when a surface fails to initialize.
    pub fn new(
        platform: &Platform,
        backend: Arc<dyn Backend>,
        config: &GroupConfig,
        params: &mut [PresentParameters],
        modes: Option<&[ModeDesc]>,
    ) -> Result<Com<Self>> {
        if params.is_empty() {
            return Err(Error::InvalidArgument);
        }
        if modes.is_some_and(|modes| modes.len() != params.len()) {
            return Err(Error::InvalidArgument);
        }

        let (major, minor) = config.driver_version;
        let setup = SurfaceSetup {
            platform: platform.clone(),
            backend,
            version: PresentVersion::negotiate(major, minor),
            ex: config.ex,
            no_window_changes: config.behavior.contains(BehaviorFlags::NOWINDOWCHANGES),
        };

        let mut surfaces = Vec::new();
        surfaces
            .try_reserve_exact(params.len())
            .map_err(|_| Error::OutOfResources)?;
        for (index, head) in params.iter_mut().enumerate() {
            let mode = modes.and_then(|modes| modes.get(index));
            let surface = PresentSurface::create(&setup, config.focus, head, mode)
                .inspect_err(|err| log::error!("Head {index}: surface creation failed: {err}"))?;
            surfaces.push(Com::new(surface));
        }

        log::debug!(
            "Created present group with {} head(s), present v{}.{}",
            surfaces.len(),
            setup.version.major,
            setup.version.minor
        );
        Ok(Com::new(Self { setup, surfaces }))
    }

    /// Number of heads.
    #[must_use]
    pub fn multihead_count(&self) -> u32 {
        u32::try_from(self.surfaces.len()).unwrap_or(u32::MAX)
    }

    /// A new reference to the surface for head `index`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `index` is out of range.
    pub fn get_present(&self, index: u32) -> Result<Com<PresentSurface>> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.surfaces.get(index))
            .map(Com::add_ref)
            .ok_or(Error::InvalidArgument)
    }

    /// Builds an extra surface for an additional swap chain.
    ///
    /// The surface has no focus window, so `params` must name a device
    /// window. The group does not keep it.
    ///
    /// # Errors
    ///
    /// As for [`PresentGroup::new`].
    pub fn create_additional_present(
        &self,
        params: &mut PresentParameters,
    ) -> Result<Com<PresentSurface>> {
        PresentSurface::create(&self.setup, None, params, None).map(Com::new)
    }

    /// The negotiated protocol version.
    #[must_use]
    pub fn version(&self) -> PresentVersion {
        self.setup.version
    }
}

impl Unknown for PresentGroup {
    const NAME: &'static str = "PresentGroup";

    fn supports(&self, iid: Iid) -> bool {
        iid == Iid::PresentGroup
    }
}
