// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer-sharing present extension contract.
//!
//! The display server's present extension queues pixmaps for display and
//! reports, per pixmap, when it has finished reading them. A surface owns one
//! [`PresentContext`]; every imported pixmap gets a [`ReleaseToken`] inside
//! that context.
//!
//! ```text
//!   track_pixmap ─► prepare ─► submit ─► wait_released / is_released
//!        │                                      │
//!        └──────────── try_free ◄───────────────┘
//! ```

use crate::backend::PixmapHandle;
use crate::geometry::{Rect, Region};
use crate::window::NativeWindow;

/// Per-surface tracking state created by [`PresentExtension::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PresentContext(pub u64);

/// Per-pixmap release tracking created by [`PresentExtension::track_pixmap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReleaseToken(pub u64);

/// How a pixmap is handed to the present queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubmitOptions<'a> {
    /// Vertical blanks to wait; zero presents immediately.
    pub interval: u32,
    /// Present without waiting for vertical blank.
    pub async_present: bool,
    /// Copy instead of flipping so the buffer releases as soon as possible.
    pub force_copy: bool,
    /// Source rectangle within the pixmap.
    pub source: Option<Rect>,
    /// Destination rectangle within the window.
    pub destination: Option<Rect>,
    /// Changed area hint.
    pub dirty: Option<&'a Region>,
}

/// The display server's present extension.
pub trait PresentExtension: Send + Sync {
    /// Returns `true` when the extension is available at `major.minor` or
    /// later.
    fn check_extension(&self, major: u32, minor: u32) -> bool;

    /// Creates tracking state for one surface.
    fn init(&self) -> Option<PresentContext>;

    /// Destroys tracking state created by [`init`](Self::init).
    fn destroy(&self, context: PresentContext);

    /// Starts tracking `pixmap` for release notifications.
    fn track_pixmap(
        &self,
        context: PresentContext,
        pixmap: PixmapHandle,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Option<ReleaseToken>;

    /// Stops tracking. The pixmap may still be in flight.
    fn try_free(&self, token: ReleaseToken);

    /// Binds `token` to `window` ahead of a submit.
    fn prepare(&self, window: NativeWindow, token: ReleaseToken) -> bool;

    /// Queues the pixmap behind `token` for display on `window`.
    fn submit(&self, window: NativeWindow, token: ReleaseToken, options: &SubmitOptions<'_>)
    -> bool;

    /// Blocks until the display server releases the pixmap.
    fn wait_released(&self, token: ReleaseToken) -> bool;

    /// Returns `true` if the pixmap is not in use by the display server.
    fn is_released(&self, token: ReleaseToken) -> bool;

    /// Blocks until any pixmap in `context` is released.
    fn wait_release_event(&self, context: PresentContext);
}
