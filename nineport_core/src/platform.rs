// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The display connection: window system plus present extension.

use core::fmt;
use std::sync::Arc;

use crate::present::PresentExtension;
use crate::window::WindowSystem;

/// Shared handles to the services of one display connection.
#[derive(Clone)]
pub struct Platform {
    /// Displays, windows, cursor, and gamma.
    pub windows: Arc<dyn WindowSystem>,
    /// The buffer-sharing present extension.
    pub present: Arc<dyn PresentExtension>,
}

impl Platform {
    /// Bundles the two services.
    pub fn new(windows: Arc<dyn WindowSystem>, present: Arc<dyn PresentExtension>) -> Self {
        Self { windows, present }
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
