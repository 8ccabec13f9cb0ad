// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame presentation for nineport devices.
//!
//! A device created on an adapter group gets one [`PresentGroup`], which holds
//! one [`PresentSurface`] per head. Surfaces import shared buffers from the
//! backend, submit them to the window system through the present extension,
//! and track when the display server hands them back.
//!
//! Optional surface operations are gated on the [`PresentVersion`] the group
//! negotiated with the vendor module; below their tier they fail with
//! [`Error::NotAvailable`](nineport_core::Error::NotAvailable).

mod flags;
mod group;
mod raster;
mod surface;
mod version;

pub use flags::DerivedFlags;
pub use group::{GroupConfig, PresentGroup};
pub use raster::{FALLBACK_REFRESH_HZ, RasterStatus, VBLANK_LINES, raster_status};
pub use surface::{ImportedBuffer, PresentStats, PresentSurface, THREAD_NAME, WindowInfo};
pub use version::{PresentFeature, PresentVersion};
