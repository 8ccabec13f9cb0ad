// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window-system contract: displays, windows, cursor, and gamma.
//!
//! The window system owns the application's windows and the list of attached
//! displays. Everything here is consumed: the workspace never creates a
//! window, it only queries and reconfigures the ones the application hands
//! over.

use bytemuck::{Pod, Zeroable};

use crate::error::PlatformError;
use crate::geometry::Point;
use crate::mode::DisplayMode;
use crate::time;

/// An application window, as the window system identifies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// The display-server drawable behind a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeWindow(pub u64);

/// A physical display, identified by its index in the window system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct MonitorId(pub u32);

/// A cursor created by [`WindowSystem::create_color_cursor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CursorHandle(pub u64);

/// Cursor bitmaps are always this many pixels on each side.
pub const CURSOR_SIZE: usize = 32;

const CURSOR_BYTES: usize = CURSOR_SIZE * CURSOR_SIZE * 4;

/// A 32×32 RGBA cursor bitmap, rows top to bottom, 4 bytes per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CursorImage {
    pixels: [u8; CURSOR_BYTES],
}

impl CursorImage {
    /// Reads a bitmap from tightly packed RGBA bytes.
    ///
    /// Returns `None` unless `bytes` is exactly one 32×32 RGBA image.
    #[must_use]
    pub fn from_rgba(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    /// Returns the raw RGBA bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Per-channel gamma lookup tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct GammaRamp {
    /// Red channel.
    pub red: [u16; 256],
    /// Green channel.
    pub green: [u16; 256],
    /// Blue channel.
    pub blue: [u16; 256],
}

impl GammaRamp {
    /// The identity ramp.
    #[must_use]
    pub fn linear() -> Self {
        let mut ramp = Self::zeroed();
        for (i, value) in (0_u16..).zip(ramp.red.iter_mut()) {
            *value = i * 257;
        }
        ramp.green = ramp.red;
        ramp.blue = ramp.red;
        ramp
    }

    /// Reads a ramp from its in-memory layout (red, green, blue tables of
    /// native-endian `u16`).
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }
}

/// Display and window services the presentation layer depends on.
///
/// Implementations must be usable from any thread.
pub trait WindowSystem: Send + Sync {
    /// Returns `true` once the video subsystem is up.
    fn video_initialized(&self) -> bool {
        true
    }

    /// Number of attached displays.
    fn num_video_displays(&self) -> Result<u32, PlatformError>;

    /// Number of modes display `display` supports.
    fn num_display_modes(&self, display: u32) -> Result<u32, PlatformError>;

    /// Mode `index` of display `display`.
    fn display_mode(&self, display: u32, index: u32) -> Result<DisplayMode, PlatformError>;

    /// The mode display `display` is currently running.
    fn current_display_mode(&self, display: u32) -> Result<DisplayMode, PlatformError>;

    /// Index of the display `window` is on.
    fn window_display_index(&self, window: WindowId) -> Result<u32, PlatformError>;

    /// The mode `window` uses when fullscreen.
    fn window_display_mode(&self, window: WindowId) -> Result<DisplayMode, PlatformError>;

    /// Sets the mode `window` uses when fullscreen.
    fn set_window_display_mode(
        &self,
        window: WindowId,
        mode: &DisplayMode,
    ) -> Result<(), PlatformError>;

    /// Switches `window` between fullscreen and windowed.
    fn set_window_fullscreen(&self, window: WindowId, fullscreen: bool)
    -> Result<(), PlatformError>;

    /// Client-area size of `window`, or `None` if the window is unknown.
    fn window_size(&self, window: WindowId) -> Option<(u32, u32)>;

    /// Resizes the client area of `window`.
    fn set_window_size(&self, window: WindowId, width: u32, height: u32);

    /// Whether `window` is minimized.
    fn window_minimized(&self, window: WindowId) -> bool;

    /// The display-server drawable behind `window`.
    fn native_window(&self, window: WindowId) -> Result<NativeWindow, PlatformError>;

    /// Asks the compositor to stop compositing `native`.
    fn set_bypass_compositor(&self, native: NativeWindow, bypass: bool)
    -> Result<(), PlatformError>;

    /// Opts `native` into variable refresh.
    fn set_variable_refresh(&self, native: NativeWindow, enable: bool)
    -> Result<(), PlatformError>;

    /// Global pointer position.
    fn global_mouse_state(&self) -> Result<Point, PlatformError>;

    /// Moves the pointer in global coordinates.
    fn warp_mouse_global(&self, position: Point) -> Result<(), PlatformError>;

    /// Shows or hides the pointer.
    fn show_cursor(&self, visible: bool);

    /// Creates a color cursor from `image` with the given hotspot.
    fn create_color_cursor(
        &self,
        image: &CursorImage,
        hotspot: Point,
    ) -> Result<CursorHandle, PlatformError>;

    /// Makes `cursor` current; `None` restores the default cursor.
    fn set_cursor(&self, cursor: Option<CursorHandle>);

    /// Frees a cursor created by [`create_color_cursor`](Self::create_color_cursor).
    fn free_cursor(&self, cursor: CursorHandle);

    /// Applies a gamma ramp to the display `window` is on.
    fn set_window_gamma_ramp(&self, window: WindowId, ramp: &GammaRamp)
    -> Result<(), PlatformError>;

    /// Current value of the high-resolution counter.
    fn performance_counter(&self) -> u64 {
        time::now().ticks()
    }

    /// Ticks per second of [`performance_counter`](Self::performance_counter).
    fn performance_frequency(&self) -> u64 {
        time::FREQUENCY
    }
}
