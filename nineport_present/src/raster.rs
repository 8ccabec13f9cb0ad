// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Emulated raster status.
//!
//! There is no portable way to read the scanout position, so the position is
//! synthesized from the performance counter and the refresh rate. The result
//! is a plausible, steadily advancing value, not the real beam position.

/// Lines assumed in the vertical blank.
pub const VBLANK_LINES: u32 = 20;

/// Refresh rate assumed when the display reports none.
pub const FALLBACK_REFRESH_HZ: u32 = 60;

/// A synthesized scanout position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RasterStatus {
    /// `true` while the synthetic beam is in the vertical blank.
    pub in_vblank: bool,
    /// Current scanline; zero while in the vertical blank.
    pub scanline: u32,
}

/// Computes an emulated raster status.
///
/// A frame lasts `frequency / refresh_hz` counter ticks and is divided into
/// `height + 20` lines, the last 20 being the vertical blank. A zero refresh
/// rate is treated as 60 Hz; tick counts per frame and per line never drop
/// below one.
#[must_use]
pub fn raster_status(counter: u64, frequency: u64, refresh_hz: u32, height: u32) -> RasterStatus {
    let refresh_hz = if refresh_hz == 0 {
        FALLBACK_REFRESH_HZ
    } else {
        refresh_hz
    };
    let ticks_per_frame = (frequency / u64::from(refresh_hz)).max(1);
    let ticks_per_line = (ticks_per_frame / (u64::from(height) + u64::from(VBLANK_LINES))).max(1);
    let line = (counter % ticks_per_frame) / ticks_per_line;

    if line < u64::from(height) {
        RasterStatus {
            in_vblank: false,
            scanline: u32::try_from(line).unwrap_or(u32::MAX),
        }
    } else {
        RasterStatus {
            in_vblank: true,
            scanline: 0,
        }
    }
}
