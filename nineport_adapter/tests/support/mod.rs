// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vendor module doubles and a ready-made [`System`].

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nineport_adapter::driver::{
    AdapterDriver, AdapterIdentifier, Caps, Device, DeviceRequest, DeviceType, DriverModule,
    ModuleLoader, MultisampleType, ResourceType, Usage,
};
use nineport_adapter::{DriverCache, LoaderConfig, System};
use nineport_core::com::Com;
use nineport_core::error::{Error, PlatformError, Result};
use nineport_core::format::Format;
use nineport_core::window::WindowId;
use nineport_mock::{MockBackendProvider, MockPresentExtension, MockWindowSystem};
use nineport_present::PresentGroup;
use rustix::fd::BorrowedFd;

/// Path every fixture loader accepts.
pub const MODULE_PATH: &str = "/nonexistent/nineport/d3dadapter9.so.1";

/// The focus window every fixture creates.
pub const FOCUS: WindowId = WindowId(1);

/// Observable state of every [`MockDriver`] a module creates.
#[derive(Debug, Default)]
pub struct DriverState {
    /// Formats the driver refuses as render targets.
    pub rejected_formats: Vec<Format>,
    /// Error returned by device creation, if any.
    pub create_error: Option<Error>,
    /// Base-interface devices built.
    pub created: u32,
    /// Extended-interface devices built.
    pub created_ex: u32,
    /// Heads in the last device request.
    pub last_heads: usize,
}

/// A device that keeps its presentation group alive.
#[derive(Debug)]
pub struct MockDevice {
    group: Com<PresentGroup>,
}

impl Device for MockDevice {
    fn present_group(&self) -> &Com<PresentGroup> {
        &self.group
    }
}

/// A driver adapter answering from [`DriverState`].
#[derive(Debug)]
pub struct MockDriver {
    state: Arc<Mutex<DriverState>>,
}

impl MockDriver {
    fn state(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build(&self, request: &DeviceRequest<'_>, group: &Com<PresentGroup>, ex: bool) -> Result<Box<dyn Device>> {
        let mut state = self.state();
        state.last_heads = request.params.len();
        if let Some(err) = state.create_error {
            return Err(err);
        }
        if ex {
            state.created_ex += 1;
        } else {
            state.created += 1;
        }
        Ok(Box::new(MockDevice {
            group: group.add_ref(),
        }))
    }
}

impl AdapterDriver for MockDriver {
    fn identifier(&self, _flags: u32) -> Result<AdapterIdentifier> {
        Ok(AdapterIdentifier {
            driver: "nine".to_owned(),
            description: "Mock adapter".to_owned(),
            vendor_id: 0x1002,
            ..AdapterIdentifier::default()
        })
    }

    fn check_device_type(
        &self,
        _device_type: DeviceType,
        _adapter_format: Format,
        _back_buffer_format: Format,
        _windowed: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn check_device_format(
        &self,
        _device_type: DeviceType,
        _adapter_format: Format,
        _usage: Usage,
        _resource: ResourceType,
        check_format: Format,
    ) -> Result<()> {
        if self.state().rejected_formats.contains(&check_format) {
            Err(Error::NotAvailable)
        } else {
            Ok(())
        }
    }

    fn check_device_multisample_type(
        &self,
        _device_type: DeviceType,
        _surface_format: Format,
        _windowed: bool,
        multisample: MultisampleType,
    ) -> Result<u32> {
        if multisample == MultisampleType::NONE {
            Ok(1)
        } else {
            Err(Error::NotAvailable)
        }
    }

    fn check_depth_stencil_match(
        &self,
        _device_type: DeviceType,
        _adapter_format: Format,
        _render_target_format: Format,
        _depth_stencil_format: Format,
    ) -> Result<()> {
        Ok(())
    }

    fn check_device_format_conversion(
        &self,
        _device_type: DeviceType,
        _source_format: Format,
        _target_format: Format,
    ) -> Result<()> {
        Ok(())
    }

    fn device_caps(&self, device_type: DeviceType) -> Result<Caps> {
        Ok(Caps {
            device_type,
            max_texture_width: 16384,
            max_texture_height: 16384,
            ..Caps::default()
        })
    }

    fn create_device(
        &self,
        request: &DeviceRequest<'_>,
        group: &Com<PresentGroup>,
    ) -> Result<Box<dyn Device>> {
        self.build(request, group, false)
    }

    fn create_device_ex(
        &self,
        request: &DeviceRequest<'_>,
        group: &Com<PresentGroup>,
    ) -> Result<Box<dyn Device>> {
        self.build(request, group, true)
    }
}

/// A vendor module handing out [`MockDriver`]s.
#[derive(Debug)]
pub struct MockModule {
    /// Reported `(major, minor)`.
    pub version: (u32, u32),
    /// Refuse every adapter.
    pub fail_create_adapter: bool,
    /// State shared by every driver this module creates.
    pub driver: Arc<Mutex<DriverState>>,
    adapters: AtomicUsize,
}

impl MockModule {
    /// A version 0.2 module.
    pub fn new() -> Self {
        Self {
            version: (0, 2),
            fail_create_adapter: false,
            driver: Arc::default(),
            adapters: AtomicUsize::new(0),
        }
    }

    /// Number of adapters created.
    pub fn adapters_created(&self) -> usize {
        self.adapters.load(Ordering::SeqCst)
    }
}

impl Default for MockModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverModule for MockModule {
    fn version(&self) -> (u32, u32) {
        self.version
    }

    fn create_adapter(&self, _fd: BorrowedFd<'_>) -> Result<Box<dyn AdapterDriver>> {
        if self.fail_create_adapter {
            return Err(Error::DriverInternal);
        }
        self.adapters.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDriver {
            state: Arc::clone(&self.driver),
        }))
    }
}

/// A loader that opens only the paths it was told about.
#[derive(Debug)]
pub struct MockLoader {
    module: Arc<MockModule>,
    accept: Vec<PathBuf>,
    opened: Mutex<Vec<PathBuf>>,
}

impl MockLoader {
    /// A loader opening `module` from any path in `accept`.
    pub fn new(module: Arc<MockModule>, accept: &[&str]) -> Self {
        Self {
            module,
            accept: accept.iter().map(PathBuf::from).collect(),
            opened: Mutex::default(),
        }
    }

    /// Every path tried, in order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ModuleLoader for MockLoader {
    fn open(&self, path: &Path) -> core::result::Result<Arc<dyn DriverModule>, PlatformError> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
        if self.accept.iter().any(|accepted| accepted == path) {
            let module: Arc<dyn DriverModule> = self.module.clone();
            Ok(module)
        } else {
            Err(PlatformError::new(format!(
                "{}: cannot open shared object file",
                path.display()
            )))
        }
    }
}

/// A system over mock collaborators with its own probe cache.
pub struct Fixture {
    /// The system under test.
    pub system: System,
    /// Window system behind the platform.
    pub windows: Arc<MockWindowSystem>,
    /// Present extension behind the platform.
    pub present: Arc<MockPresentExtension>,
    /// Backend provider.
    pub backends: Arc<MockBackendProvider>,
    /// The vendor module.
    pub module: Arc<MockModule>,
    /// The loader, which opens only the fixture path.
    pub loader: Arc<MockLoader>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// One display, a working backend, and a version 0.2 module.
    pub fn new() -> Self {
        Self::with(MockBackendProvider::new(), MockModule::new())
    }

    /// Builds a fixture around the given provider and module.
    pub fn with(backends: MockBackendProvider, module: MockModule) -> Self {
        let (platform, windows, present) = nineport_mock::platform();
        windows.add_window(FOCUS, 1024, 768);
        let backends = Arc::new(backends);
        let module = Arc::new(module);
        let loader = Arc::new(MockLoader::new(Arc::clone(&module), &[MODULE_PATH]));
        let system = System {
            platform,
            backends: backends.clone(),
            loader: loader.clone(),
            loader_config: LoaderConfig::with_override(Some(MODULE_PATH.to_owned())),
            cache: Arc::new(DriverCache::new()),
        };
        Self {
            system,
            windows,
            present,
            backends,
            module,
            loader,
        }
    }

    /// Locks the driver state shared by every adapter.
    pub fn driver(&self) -> MutexGuard<'_, DriverState> {
        self.module
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
