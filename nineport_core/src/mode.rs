// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display modes in native and application-facing form.

use crate::format::{Format, PixelFormat, to_api, to_native};

/// A display mode as the window system reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DisplayMode {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Refresh rate in Hz; zero when unreported.
    pub refresh_rate: u32,
    /// Native pixel format.
    pub format: PixelFormat,
}

impl DisplayMode {
    /// Converts to the application-facing form.
    ///
    /// The format goes through the lookup table; scanline ordering is always
    /// progressive.
    #[must_use]
    pub fn to_desc(&self) -> ModeDesc {
        ModeDesc {
            width: self.width,
            height: self.height,
            refresh_rate: self.refresh_rate,
            format: to_api(self.format),
            scanline_ordering: ScanlineOrdering::Progressive,
        }
    }
}

/// Scanline ordering of a mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ScanlineOrdering {
    /// Not specified.
    #[default]
    Unknown,
    /// Progressive scan.
    Progressive,
    /// Interlaced scan.
    Interlaced,
}

/// Display rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// Not rotated.
    #[default]
    Identity,
    /// Rotated 90 degrees.
    Rotate90,
    /// Rotated 180 degrees.
    Rotate180,
    /// Rotated 270 degrees.
    Rotate270,
}

/// A display mode as the application sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ModeDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Refresh rate in Hz; zero for "driver default".
    pub refresh_rate: u32,
    /// Surface format.
    pub format: Format,
    /// Scanline ordering.
    pub scanline_ordering: ScanlineOrdering,
}

impl ModeDesc {
    /// Converts to the native form the window system accepts.
    #[must_use]
    pub fn to_native(&self) -> DisplayMode {
        DisplayMode {
            width: self.width,
            height: self.height,
            refresh_rate: self.refresh_rate,
            format: to_native(self.format),
        }
    }
}

/// Filter for the extended mode enumeration.
///
/// Only `format` is honored; the ordering is accepted and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DisplayModeFilter {
    /// Format to enumerate.
    pub format: Format,
    /// Requested scanline ordering.
    pub scanline_ordering: ScanlineOrdering,
}
