// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Present protocol version negotiation and feature tiers.
//!
//! The protocol grows by minor versions. Each optional surface operation is
//! tied to the minor version that introduced it; a group negotiates its
//! version once, before building any surface, and every surface checks the
//! negotiated version before running an optional operation.

use nineport_core::error::{Error, Result};

/// A negotiated present protocol version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PresentVersion {
    /// Major version; only 1 exists.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

/// Optional operations gated on the negotiated minor version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresentFeature {
    /// Occlusion query on the focus window.
    WindowOccluded,
    /// Mode-versus-back-buffer mismatch polling.
    ResolutionMismatch,
    /// Native thread spawn and join passthrough.
    ThreadHelpers,
    /// The second parameter block.
    Params2,
    /// Non-blocking buffer release polling.
    BufferReleasePolling,
    /// Waiting on any release event.
    ReleaseEvent,
    /// Pointer position is checked before and after every warp.
    CursorPositionCheck,
}

impl PresentFeature {
    /// Minor version that introduced this feature.
    #[must_use]
    pub const fn since_minor(self) -> u32 {
        match self {
            Self::WindowOccluded => 1,
            Self::ResolutionMismatch | Self::ThreadHelpers => 2,
            Self::Params2 | Self::BufferReleasePolling | Self::ReleaseEvent => 3,
            Self::CursorPositionCheck => 4,
        }
    }
}

impl PresentVersion {
    /// Highest version this implementation speaks.
    pub const MAX: Self = Self { major: 1, minor: 4 };

    /// Negotiates against the vendor module's `major.minor`.
    ///
    /// Present 1.4 requires vendor module 0.2; older modules clamp the minor
    /// version to 3. A newer vendor major is rejected earlier, at load time,
    /// and never reaches this function.
    #[must_use]
    pub fn negotiate(driver_major: u32, driver_minor: u32) -> Self {
        let mut version = Self::MAX;
        if driver_minor < 2 && version.minor > 3 {
            version.minor = 3;
            log::trace!(
                "Limiting present version due to d3dadapter9 v{driver_major}.{driver_minor}"
            );
        }
        log::trace!("Active present version: v{}.{}", version.major, version.minor);
        version
    }

    /// Returns `true` when `feature` is available at this version.
    #[inline]
    #[must_use]
    pub const fn supports(self, feature: PresentFeature) -> bool {
        self.major == 1 && self.minor >= feature.since_minor()
    }

    /// Fails with [`Error::NotAvailable`] unless `feature` is available.
    pub(crate) fn require(self, feature: PresentFeature) -> Result<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            log::debug!(
                "{feature:?} needs present v1.{}, negotiated v{}.{}",
                feature.since_minor(),
                self.major,
                self.minor
            );
            Err(Error::NotAvailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PresentFeature, PresentVersion};
    use nineport_core::error::Error;

    #[test]
    fn current_vendor_module_gets_max() {
        assert_eq!(PresentVersion::negotiate(0, 2), PresentVersion::MAX);
        assert_eq!(PresentVersion::negotiate(0, 7).minor, 4);
    }

    #[test]
    fn old_vendor_module_clamps_minor_to_three() {
        let version = PresentVersion::negotiate(0, 1);
        assert_eq!(version, PresentVersion { major: 1, minor: 3 });
        assert!(version.supports(PresentFeature::Params2));
        assert!(!version.supports(PresentFeature::CursorPositionCheck));
    }

    #[test]
    fn tiers_are_cumulative() {
        let v1_1 = PresentVersion { major: 1, minor: 1 };
        assert!(v1_1.supports(PresentFeature::WindowOccluded));
        assert!(!v1_1.supports(PresentFeature::ThreadHelpers));
        assert_eq!(
            v1_1.require(PresentFeature::ReleaseEvent),
            Err(Error::NotAvailable)
        );
        assert_eq!(PresentVersion::MAX.require(PresentFeature::ReleaseEvent), Ok(()));
    }
}
