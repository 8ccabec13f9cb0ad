// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted object handles and interface queries.
//!
//! Every entity handed to the application (the factory, presentation groups,
//! presentation surfaces) lives behind a [`Com`] handle. The count is the
//! handle's `Arc` strong count, so increments and decrements are atomic and
//! the value's `Drop` runs exactly once, synchronously, on the thread that
//! drops the last handle.
//!
//! Interface selection is a closed set: [`Iid`] names every interface the
//! workspace knows about, and each object kind declares the subset it
//! implements through [`Unknown::supports`].

use core::fmt;
use core::ops::Deref;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Interface identifiers understood by [`Com::query_interface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Iid {
    /// The identity interface; every object supports it.
    Unknown,
    /// The base factory interface.
    Direct3D9,
    /// The extended factory interface.
    Direct3D9Ex,
    /// A presentation surface.
    Present,
    /// A presentation group.
    PresentGroup,
}

/// Implemented by every object that can sit behind a [`Com`] handle.
pub trait Unknown: Send + Sync {
    /// Short type name used in reference-count traces.
    const NAME: &'static str;

    /// Returns `true` when this object implements `iid`.
    ///
    /// [`Iid::Unknown`] is handled by [`Com::query_interface`] and need not be
    /// listed.
    fn supports(&self, iid: Iid) -> bool;
}

/// An owning, reference-counted handle to an object.
///
/// Cloning is explicit through [`add_ref`](Self::add_ref); dropping a handle
/// or calling [`release`](Self::release) gives up one reference.
pub struct Com<T: Unknown> {
    inner: Arc<T>,
}

impl<T: Unknown> Com<T> {
    /// Wraps a freshly constructed object with a reference count of one.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Takes another reference to the object and returns it.
    ///
    /// After this call [`ref_count`](Self::ref_count) reports the
    /// post-increment count.
    #[must_use]
    pub fn add_ref(&self) -> Self {
        let inner = Arc::clone(&self.inner);
        log::trace!(
            "{} {:p} increasing refcount to {}.",
            T::NAME,
            Arc::as_ptr(&inner),
            Arc::strong_count(&inner)
        );
        Self { inner }
    }

    /// Gives up this reference and returns the number of references left.
    ///
    /// When the returned count is zero the object has already been torn down.
    /// A non-zero count is a snapshot; other threads may release concurrently.
    pub fn release(self) -> u32 {
        let ptr = Arc::as_ptr(&self.inner);
        let before = Arc::strong_count(&self.inner);
        match Arc::into_inner(self.inner) {
            Some(value) => {
                log::trace!("{} {:p} decreasing refcount to 0.", T::NAME, ptr);
                drop(value);
                0
            }
            None => {
                // Another holder gets zero; never report it here.
                let remaining = count_u32(before.saturating_sub(1)).max(1);
                log::trace!(
                    "{} {:p} decreasing refcount to {}.",
                    T::NAME,
                    ptr,
                    remaining
                );
                remaining
            }
        }
    }

    /// Returns the current number of references.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        count_u32(Arc::strong_count(&self.inner))
    }

    /// Returns another reference to this object if it implements `iid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInterface`] when the interface is not implemented.
    /// The count is left untouched in that case.
    pub fn query_interface(&self, iid: Iid) -> Result<Self> {
        if iid == Iid::Unknown || self.inner.supports(iid) {
            return Ok(self.add_ref());
        }
        log::debug!("{:?} not implemented on {}, returning NoInterface.", iid, T::NAME);
        Err(Error::NoInterface)
    }

    /// Returns `true` when both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Unknown> Deref for Com<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Unknown> fmt::Debug for Com<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Com")
            .field("object", &T::NAME)
            .field("refs", &self.ref_count())
            .finish_non_exhaustive()
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
