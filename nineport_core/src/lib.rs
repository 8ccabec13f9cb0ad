// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Result codes, object model, formats, and platform contracts.
//!
//! `nineport_core` holds everything the presentation and adapter crates share:
//! the closed set of result codes an application can observe, the
//! reference-counted object base, the two color-format enumerations and the
//! lookup table between them, display modes, presentation parameters, and the
//! contracts the outside world must implement.
//!
//! # Architecture
//!
//! ```text
//!   Direct3D9 (nineport_adapter)
//!       │  topology: groups ─► outputs ─► modes
//!       │  driver adapter per group, Backend per group
//!       ▼
//!   PresentGroup (nineport_present)
//!       │  one PresentSurface per head
//!       ▼
//!   PresentSurface ──► Backend (pixmap import, copy)
//!                  ──► PresentExtension (prepare, submit, release tokens)
//!                  ──► WindowSystem (modes, sizes, cursor, gamma)
//! ```
//!
//! **[`error`]**: the closed result-code set returned across the public
//! boundary.
//!
//! **[`com`]**: [`Com`](com::Com) handles with atomic reference counts and a
//! closed interface-id set.
//!
//! **[`format`]**: API formats, native pixel formats, and the mapping between
//! them.
//!
//! **[`backend`]**, **[`present`]**, **[`window`]**: consumed contracts,
//! bundled into a [`Platform`](platform::Platform).
//!
//! **[`time`]**: monotonic host ticks used as the default performance counter.

pub mod backend;
pub mod com;
pub mod error;
pub mod format;
pub mod geometry;
pub mod mode;
pub mod params;
pub mod platform;
pub mod present;
pub mod time;
pub mod window;

pub use error::{Error, PlatformError, Result};
