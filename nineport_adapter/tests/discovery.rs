// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module probing and adapter discovery failures.

mod support;

use std::path::PathBuf;
use std::sync::Arc;

use nineport_adapter::module::{LoaderConfig, MODULE_FILE_NAME, load_module};
use nineport_adapter::{CreateDevice, direct3d_create9, direct3d_create9_ex};
use nineport_adapter::driver::DeviceType;
use nineport_core::error::Error;
use nineport_core::format::Format;
use nineport_core::params::{BehaviorFlags, PresentParameters};
use nineport_mock::MockBackendProvider;
use nineport_present::PresentVersion;

use support::{FOCUS, Fixture, MODULE_PATH, MockLoader, MockModule};

fn with_backends(configure: impl FnOnce(&mut MockBackendProvider)) -> Fixture {
    let mut backends = MockBackendProvider::new();
    configure(&mut backends);
    Fixture::with(backends, MockModule::new())
}

fn with_module(configure: impl FnOnce(&mut MockModule)) -> Fixture {
    let mut module = MockModule::new();
    configure(&mut module);
    Fixture::with(MockBackendProvider::new(), module)
}

#[test]
fn unacquirable_backend_leaves_no_adapter() {
    let fixture = with_backends(|backends| backends.fail_acquire = true);
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
    assert_eq!(fixture.backends.acquired_count(), 0);
    assert_eq!(fixture.module.adapters_created(), 0);
}

#[test]
fn backend_without_descriptor_is_dropped() {
    let fixture = with_backends(|backends| backends.without_fd = true);
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
    assert_eq!(fixture.backends.acquired_count(), 1);
    assert_eq!(fixture.backends.dropped_backends(), 1);
    assert_eq!(fixture.module.adapters_created(), 0);
}

#[test]
fn refused_adapter_drops_its_backend() {
    let fixture = with_module(|module| module.fail_create_adapter = true);
    assert!(direct3d_create9(&fixture.system).is_none());
    assert_eq!(fixture.backends.dropped_backends(), 1);
}

#[test]
fn no_displays_means_no_adapters() {
    let fixture = Fixture::new();
    fixture.windows.state().displays.clear();
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
    assert_eq!(fixture.module.adapters_created(), 1);
    assert_eq!(fixture.backends.dropped_backends(), 1);
}

#[test]
fn uncountable_displays_mean_no_adapters() {
    let fixture = Fixture::new();
    fixture.windows.state().fail_display_count = true;
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
}

#[test]
fn module_is_probed_once_per_cache() {
    let fixture = Fixture::new();
    assert!(!fixture.system.cache.attempted());

    let first = direct3d_create9(&fixture.system).unwrap();
    let second = direct3d_create9_ex(&fixture.system).unwrap();
    assert!(fixture.system.cache.attempted());
    assert_eq!(fixture.loader.opened(), vec![PathBuf::from(MODULE_PATH)]);

    assert!(!first.ptr_eq(&second), "each call builds its own factory");
    assert_eq!(fixture.module.adapters_created(), 2);
    assert_eq!(fixture.backends.acquired_count(), 2);
}

#[test]
fn failed_probe_is_remembered() {
    let fixture = with_module(|module| module.version = (1, 0));
    assert!(direct3d_create9(&fixture.system).is_none());
    assert!(fixture.system.cache.attempted());
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
    assert_eq!(fixture.loader.opened().len(), 1, "no second load attempt");
    assert_eq!(fixture.backends.acquired_count(), 0);
}

#[test]
fn old_present_extension_fails_the_probe() {
    let fixture = Fixture::new();
    fixture.present.state().version = (0, 9);
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
    assert_eq!(fixture.module.adapters_created(), 0);
}

#[test]
fn unavailable_backend_fails_the_probe() {
    let fixture = with_backends(|backends| backends.available = false);
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::NotAvailable
    );
    assert_eq!(fixture.backends.acquired_count(), 0);
}

#[test]
fn missing_module_fails_the_probe() {
    let mut fixture = Fixture::new();
    fixture.system.loader_config = LoaderConfig::with_override(Some("/nonexistent/other.so".to_owned()));
    assert!(direct3d_create9(&fixture.system).is_none());
    assert_eq!(
        fixture.loader.opened(),
        vec![PathBuf::from("/nonexistent/other.so")]
    );
}

#[test]
fn search_path_is_tried_in_order() {
    let loader = MockLoader::new(Arc::new(MockModule::new()), &["/nonexistent/b.so"]);
    let config =
        LoaderConfig::with_override(Some("/nonexistent/a.so::/nonexistent/b.so:/nonexistent/c.so".to_owned()));
    let loaded = load_module(&loader, &config).unwrap();
    assert_eq!(loaded.path, PathBuf::from("/nonexistent/b.so"));
    assert_eq!(
        loader.opened(),
        vec![
            PathBuf::from("/nonexistent/a.so"),
            PathBuf::from("/nonexistent/b.so"),
        ],
        "empty entries skipped, first success wins"
    );
    assert_eq!(loaded.module.version(), (0, 2));
}

#[test]
fn directories_get_the_module_file_name() {
    let loader = MockLoader::new(Arc::new(MockModule::new()), &[]);
    let config = LoaderConfig::with_override(Some("/:/nonexistent/d3d".to_owned()));
    let err = load_module(&loader, &config).unwrap_err();
    assert_eq!(
        loader.opened(),
        vec![
            PathBuf::from("/").join(MODULE_FILE_NAME),
            PathBuf::from("/nonexistent/d3d"),
        ]
    );
    assert!(
        err.message().starts_with("/nonexistent/d3d"),
        "last error is reported: {err}"
    );
}

#[test]
fn older_module_limits_present_version() {
    let fixture = with_module(|module| module.version = (0, 1));
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let mut params = [PresentParameters {
        back_buffer_width: 640,
        back_buffer_height: 480,
        back_buffer_format: Format::X8R8G8B8,
        windowed: true,
        ..PresentParameters::default()
    }];
    let request = CreateDevice {
        adapter: 0,
        device_type: DeviceType::Hal,
        focus: Some(FOCUS),
        behavior: BehaviorFlags::NONE,
    };
    let device = d3d.create_device(&request, &mut params).unwrap();
    assert_eq!(
        device.present_group().version(),
        PresentVersion { major: 1, minor: 3 }
    );
}
