// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation parameters and device-creation flags.

use crate::format::Format;
use crate::window::WindowId;

/// How back buffers are recycled after presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SwapEffect {
    /// Back-buffer contents are undefined after present.
    #[default]
    Discard,
    /// Back buffers rotate through a flip chain.
    Flip,
    /// The back buffer is copied and keeps its contents.
    Copy,
}

/// Requested vertical-sync behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PresentInterval {
    /// Same as [`One`](Self::One).
    #[default]
    Default,
    /// Wait for one vertical blank.
    One,
    /// Wait for two vertical blanks.
    Two,
    /// Wait for three vertical blanks.
    Three,
    /// Wait for four vertical blanks.
    Four,
    /// Do not wait.
    Immediate,
}

/// Presentation parameters for one head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PresentParameters {
    /// Back-buffer width; zero resolves from the window when windowed.
    pub back_buffer_width: u32,
    /// Back-buffer height; zero resolves from the window when windowed.
    pub back_buffer_height: u32,
    /// Back-buffer format.
    pub back_buffer_format: Format,
    /// Number of back buffers.
    pub back_buffer_count: u32,
    /// Swap effect.
    pub swap_effect: SwapEffect,
    /// Target window; `None` falls back to the focus window.
    pub device_window: Option<WindowId>,
    /// `true` for windowed, `false` for fullscreen.
    pub windowed: bool,
    /// Whether a depth-stencil buffer is created with the device.
    pub enable_auto_depth_stencil: bool,
    /// Format of the automatic depth-stencil buffer.
    pub auto_depth_stencil_format: Format,
    /// API presentation flags, passed through.
    pub flags: u32,
    /// Fullscreen refresh rate in Hz; zero when windowed.
    pub fullscreen_refresh_rate: u32,
    /// Vertical-sync request.
    pub presentation_interval: PresentInterval,
}

/// The second parameter block, negotiated separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PresentParameters2 {
    /// The display server may hold discarded buffers past their present.
    pub allow_discard_delayed_release: bool,
    /// Immediate discard presents must not tear.
    pub tear_free_discard: bool,
}

/// Device-creation behavior flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BehaviorFlags(pub u32);

impl BehaviorFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Software vertex processing.
    pub const SOFTWARE_VERTEXPROCESSING: Self = Self(0x0000_0020);
    /// Hardware vertex processing.
    pub const HARDWARE_VERTEXPROCESSING: Self = Self(0x0000_0040);
    /// Leave window geometry alone.
    pub const NOWINDOWCHANGES: Self = Self(0x0000_0800);
    /// Drive every output in the adapter group.
    pub const ADAPTERGROUP_DEVICE: Self = Self(0x0000_0200);

    /// Returns `true` when every bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for BehaviorFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::BehaviorFlags;

    #[test]
    fn flags_combine_and_test() {
        let flags = BehaviorFlags::HARDWARE_VERTEXPROCESSING | BehaviorFlags::NOWINDOWCHANGES;
        assert!(flags.contains(BehaviorFlags::NOWINDOWCHANGES));
        assert!(!flags.contains(BehaviorFlags::ADAPTERGROUP_DEVICE));
        assert!(flags.contains(BehaviorFlags::NONE));
        assert_eq!(flags.0, 0x840);
    }
}
