// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording backend and provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use nineport_core::backend::{Backend, BackendProvider, DmaBuf, PixmapHandle, ScreenId};
use rustix::fd::{AsFd, BorrowedFd, OwnedFd};
use rustix::fs::{Mode, OFlags};

/// Observable state of a [`MockBackend`].
#[derive(Debug, Default)]
pub struct BackendState {
    /// Fail every [`Backend::init`].
    pub fail_init: bool,
    /// Reject every import.
    pub fail_import: bool,
    /// Fail every front-buffer copy.
    pub fail_copy: bool,
    /// Successful `init` calls.
    pub init_calls: u32,
    /// `deinit` calls.
    pub deinit_calls: u32,
    /// Pixmaps imported and not yet destroyed.
    pub live_pixmaps: Vec<PixmapHandle>,
    /// Every `destroy_pixmap` call, in order.
    pub destroyed: Vec<PixmapHandle>,
    /// Every `present_pixmap` call, in order.
    pub presented: Vec<PixmapHandle>,
    /// Every successful `copy_front` call, in order.
    pub copied: Vec<PixmapHandle>,
    next_pixmap: u64,
}

/// A backend that records every call.
#[derive(Debug)]
pub struct MockBackend {
    state: Mutex<BackendState>,
    fd: Option<OwnedFd>,
    drops: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Creates a backend whose device descriptor is `/dev/null`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_drop_counter(Arc::new(AtomicUsize::new(0)))
    }

    /// Creates a backend without a device descriptor.
    #[must_use]
    pub fn without_fd() -> Self {
        Self::build(None, Arc::new(AtomicUsize::new(0)))
    }

    fn with_drop_counter(drops: Arc<AtomicUsize>) -> Self {
        let fd = rustix::fs::open("/dev/null", OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty())
            .map_err(|err| log::warn!("Mock backend could not open /dev/null: {err}"))
            .ok();
        Self::build(fd, drops)
    }

    fn build(fd: Option<OwnedFd>, drops: Arc<AtomicUsize>) -> Self {
        Self {
            state: Mutex::default(),
            fd,
            drops,
        }
    }

    /// Locks and returns the recorded state.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of times a backend sharing this counter has been dropped.
    #[must_use]
    pub fn drop_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.drops)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Backend for MockBackend {
    fn init(&self) -> bool {
        let mut state = self.state();
        if state.fail_init {
            return false;
        }
        state.init_calls += 1;
        true
    }

    fn deinit(&self) {
        self.state().deinit_calls += 1;
    }

    fn fd(&self) -> Option<BorrowedFd<'_>> {
        self.fd.as_ref().map(AsFd::as_fd)
    }

    fn pixmap_from_dmabuf(&self, buffer: &DmaBuf<'_>) -> Option<PixmapHandle> {
        let mut state = self.state();
        if state.fail_import || buffer.width == 0 || buffer.height == 0 {
            return None;
        }
        state.next_pixmap += 1;
        let pixmap = PixmapHandle(state.next_pixmap);
        state.live_pixmaps.push(pixmap);
        Some(pixmap)
    }

    fn copy_front(&self, pixmap: PixmapHandle) -> bool {
        let mut state = self.state();
        if state.fail_copy {
            return false;
        }
        state.copied.push(pixmap);
        true
    }

    fn present_pixmap(&self, pixmap: PixmapHandle) {
        self.state().presented.push(pixmap);
    }

    fn destroy_pixmap(&self, pixmap: PixmapHandle) {
        let mut state = self.state();
        state.live_pixmaps.retain(|live| *live != pixmap);
        state.destroyed.push(pixmap);
    }
}

/// Hands out [`MockBackend`]s and keeps weak references to them.
#[derive(Debug)]
pub struct MockBackendProvider {
    /// Result of [`BackendProvider::probe`].
    pub available: bool,
    /// Make every [`BackendProvider::acquire`] fail.
    pub fail_acquire: bool,
    /// Hand out backends without a device descriptor.
    pub without_fd: bool,
    acquired: Mutex<Vec<Weak<MockBackend>>>,
    drops: Arc<AtomicUsize>,
}

impl MockBackendProvider {
    /// A provider whose probe succeeds and whose acquires succeed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: true,
            fail_acquire: false,
            without_fd: false,
            acquired: Mutex::default(),
            drops: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of acquired backends that have since been dropped.
    #[must_use]
    pub fn dropped_backends(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    /// Number of successful acquires.
    #[must_use]
    pub fn acquired_count(&self) -> usize {
        self.acquired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The most recently acquired backend, if still alive.
    #[must_use]
    pub fn last_backend(&self) -> Option<Arc<MockBackend>> {
        self.acquired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .and_then(Weak::upgrade)
    }
}

impl Default for MockBackendProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendProvider for MockBackendProvider {
    fn probe(&self) -> bool {
        self.available
    }

    fn acquire(&self, screen: ScreenId) -> Option<Arc<dyn Backend>> {
        if self.fail_acquire {
            log::debug!("Mock acquire for screen {} refused.", screen.0);
            return None;
        }
        let backend = if self.without_fd {
            MockBackend::build(None, Arc::clone(&self.drops))
        } else {
            MockBackend::with_drop_counter(Arc::clone(&self.drops))
        };
        let backend = Arc::new(backend);
        self.acquired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&backend));
        Some(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::{MockBackend, MockBackendProvider};
    use nineport_core::backend::{Backend, BackendProvider, DmaBuf, ScreenId};

    #[test]
    fn import_and_destroy_are_recorded() {
        let backend = MockBackend::new();
        let fd = backend.fd().unwrap();
        let buffer = DmaBuf {
            fd,
            width: 64,
            height: 32,
            stride: 256,
            depth: 24,
            bpp: 32,
        };
        let pixmap = backend.pixmap_from_dmabuf(&buffer).unwrap();
        assert_eq!(backend.state().live_pixmaps, vec![pixmap]);
        backend.destroy_pixmap(pixmap);
        assert!(backend.state().live_pixmaps.is_empty());
        assert_eq!(backend.state().destroyed, vec![pixmap]);
    }

    #[test]
    fn provider_counts_drops() {
        let provider = MockBackendProvider::new();
        let backend = provider.acquire(ScreenId(0)).unwrap();
        assert!(provider.last_backend().is_some());
        drop(backend);
        assert!(provider.last_backend().is_none());
        assert_eq!(provider.dropped_backends(), 1);
    }

    #[test]
    fn fd_less_backends_report_none() {
        let provider = MockBackendProvider {
            without_fd: true,
            ..MockBackendProvider::new()
        };
        let backend = provider.acquire(ScreenId(0)).unwrap();
        assert!(backend.fd().is_none());
    }
}
