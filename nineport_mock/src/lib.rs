// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for every `nineport_core` platform contract.
//!
//! Each double keeps its observable state behind a mutex reachable through a
//! `state()` accessor. Tests flip the `fail_*` switches to drive error paths
//! and read the recorded calls back afterwards.
//!
//! ```rust,ignore
//! let (platform, windows, present) = nineport_mock::platform();
//! windows.add_window(WindowId(1), 800, 600);
//! present.state().fail_submit = true;
//! ```

mod backend;
mod present;
mod queue;
mod window;

use std::sync::Arc;

use nineport_core::platform::Platform;

pub use backend::{BackendState, MockBackend, MockBackendProvider};
pub use present::{MockPresentExtension, PresentState, Submission, Tracked};
pub use window::{MockDisplay, MockWindow, MockWindowSystem, WindowState, mode};

/// A platform with one display and a version 1.4 present extension.
///
/// Returns the platform plus the concrete doubles behind it.
#[must_use]
pub fn platform() -> (Platform, Arc<MockWindowSystem>, Arc<MockPresentExtension>) {
    let windows = Arc::new(MockWindowSystem::single_display());
    let present = Arc::new(MockPresentExtension::new());
    let platform = Platform::new(windows.clone(), present.clone());
    (platform, windows, present)
}
