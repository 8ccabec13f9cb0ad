// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter discovery and the `Direct3D9` factory.
//!
//! [`direct3d_create9`] and [`direct3d_create9_ex`] probe for the vendor
//! `d3dadapter9` module once per [`DriverCache`], discover the adapter
//! [`Topology`], and hand back a reference-counted [`Direct3D9`] factory.
//! Devices created from the factory present through a
//! [`PresentGroup`](nineport_present::PresentGroup) bound to the adapter
//! group's backend.
//!
//! **[`driver`]**: the contracts the vendor module implements.
//!
//! **[`module`]**: search path policy and the probe cache.
//!
//! **[`topology`]**: groups, outputs, modes, and the absolute id map.
//!
//! **[`perf`]**: performance event markers.

pub mod driver;
mod factory;
pub mod module;
pub mod perf;
mod system;
pub mod topology;

pub use factory::{CreateDevice, Direct3D9, Direct3D9Ex, Luid};
pub use module::{DriverCache, LoaderConfig};
pub use system::{System, direct3d_create9, direct3d_create9_ex};
pub use topology::Topology;
