// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering backend contract.
//!
//! A backend drives one physical screen through a DRI device. It is split in
//! two pieces:
//!
//! - **Provider**: [`BackendProvider`] answers whether any backend can run on
//!   this display at all and hands out a [`Backend`] for a screen.
//!
//! - **Handle**: [`Backend`] imports shared buffers as pixmaps, copies and
//!   flips them, and exposes the device file descriptor the vendor module
//!   opens its adapter on.
//!
//! # Ownership
//!
//! Backends are shared as `Arc<dyn Backend>`. The topology group that acquired
//! the backend holds one reference and every presentation surface created
//! from that group holds another, so the backend outlives all of its users.
//! Implementations release their native resources in `Drop`.
//!
//! Backends must tolerate concurrent import, copy, and destroy calls from
//! several surfaces.

use std::sync::Arc;

use rustix::fd::BorrowedFd;

/// Index of a screen on the display connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ScreenId(pub i32);

/// A pixmap created by [`Backend::pixmap_from_dmabuf`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixmapHandle(pub u64);

/// A shareable buffer exported by the rendering driver.
#[derive(Clone, Copy, Debug)]
pub struct DmaBuf<'fd> {
    /// The buffer's file descriptor; ownership stays with the caller.
    pub fd: BorrowedFd<'fd>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row pitch in bytes.
    pub stride: u32,
    /// Color depth in bits.
    pub depth: u32,
    /// Storage bits per pixel.
    pub bpp: u32,
}

/// A rendering backend bound to one screen.
pub trait Backend: Send + Sync {
    /// Prepares the backend for a presentation surface. Returns `false` on
    /// failure.
    fn init(&self) -> bool;

    /// Undoes one [`init`](Self::init).
    fn deinit(&self);

    /// The DRI device descriptor, or `None` if the backend has none.
    fn fd(&self) -> Option<BorrowedFd<'_>>;

    /// Imports `buffer` as a pixmap. Returns `None` if the import is rejected.
    fn pixmap_from_dmabuf(&self, buffer: &DmaBuf<'_>) -> Option<PixmapHandle>;

    /// Copies the current front buffer into `pixmap`.
    fn copy_front(&self, pixmap: PixmapHandle) -> bool;

    /// Flushes rendering to `pixmap` ahead of a present.
    fn present_pixmap(&self, pixmap: PixmapHandle);

    /// Releases a pixmap created by
    /// [`pixmap_from_dmabuf`](Self::pixmap_from_dmabuf).
    fn destroy_pixmap(&self, pixmap: PixmapHandle);
}

/// Discovers and opens backends.
pub trait BackendProvider: Send + Sync {
    /// Returns `true` when at least one backend can run on this display.
    fn probe(&self) -> bool;

    /// The screen discovery opens first.
    fn default_screen(&self) -> ScreenId {
        ScreenId(0)
    }

    /// Opens a backend for `screen`, or `None` if it cannot be opened.
    fn acquire(&self, screen: ScreenId) -> Option<Arc<dyn Backend>>;
}
