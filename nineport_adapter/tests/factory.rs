// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Factory operations over a discovered topology.

mod support;

use nineport_adapter::driver::{DeviceType, MultisampleType, ResourceType, Usage};
use nineport_adapter::{CreateDevice, Direct3D9Ex, direct3d_create9, direct3d_create9_ex};
use nineport_core::com::Iid;
use nineport_core::error::Error;
use nineport_core::format::Format;
use nineport_core::mode::{DisplayModeFilter, ModeDesc, Rotation, ScanlineOrdering};
use nineport_core::params::{BehaviorFlags, PresentParameters};
use nineport_core::window::{MonitorId, WindowId};
use nineport_mock::{MockDisplay, mode};

use support::{FOCUS, Fixture};

fn two_displays() -> Fixture {
    let fixture = Fixture::new();
    fixture
        .windows
        .add_display(MockDisplay::with_modes(vec![mode(2560, 1440), mode(1280, 720)]));
    fixture
}

fn windowed() -> PresentParameters {
    PresentParameters {
        back_buffer_width: 800,
        back_buffer_height: 600,
        back_buffer_format: Format::X8R8G8B8,
        back_buffer_count: 1,
        windowed: true,
        ..PresentParameters::default()
    }
}

fn request(adapter: u32, behavior: BehaviorFlags) -> CreateDevice {
    CreateDevice {
        adapter,
        device_type: DeviceType::Hal,
        focus: Some(FOCUS),
        behavior,
    }
}

#[test]
fn adapter_map_covers_every_output() {
    let fixture = two_displays();
    let d3d = direct3d_create9_ex(&fixture.system).unwrap();
    let topology = d3d.topology();

    let outputs: usize = topology
        .groups()
        .iter()
        .map(|group| group.outputs().len())
        .sum();
    assert_eq!(outputs, 2);
    assert_eq!(d3d.adapter_count(), 2);
    assert_eq!(topology.map().len(), 2);

    for (id, entry) in topology.map().iter().enumerate() {
        let id = u32::try_from(id).unwrap();
        assert!(entry.master <= id);
        let master = topology.map()[usize::try_from(entry.master).unwrap()];
        assert_eq!(master.master, entry.master, "master is its own master");
        assert_eq!(master.group, entry.group);
    }
}

#[test]
fn out_of_range_adapter_is_invalid_everywhere() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9_ex(&fixture.system).unwrap();
    let bad = d3d.adapter_count();
    let hal = DeviceType::Hal;
    let xrgb = Format::X8R8G8B8;

    assert_eq!(d3d.adapter_identifier(bad, 0).unwrap_err(), Error::InvalidArgument);
    assert_eq!(d3d.adapter_mode_count(bad, xrgb), Err(Error::InvalidArgument));
    assert_eq!(d3d.enum_adapter_modes(bad, xrgb, 0), Err(Error::InvalidArgument));
    assert_eq!(d3d.adapter_display_mode(bad), Err(Error::InvalidArgument));
    assert_eq!(
        d3d.check_device_type(bad, hal, xrgb, xrgb, true),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        d3d.check_device_format(bad, hal, xrgb, Usage::RENDERTARGET, ResourceType::Surface, xrgb),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        d3d.check_device_multisample_type(bad, hal, xrgb, true, MultisampleType::NONE),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        d3d.check_depth_stencil_match(bad, hal, xrgb, xrgb, Format::D24S8),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        d3d.check_device_format_conversion(bad, hal, xrgb, xrgb),
        Err(Error::InvalidArgument)
    );
    assert_eq!(d3d.device_caps(bad, hal), Err(Error::InvalidArgument));
    assert_eq!(d3d.adapter_monitor(bad), Err(Error::InvalidArgument));
    assert_eq!(
        d3d.create_device(&request(bad, BehaviorFlags::NONE), &mut [windowed()])
            .unwrap_err(),
        Error::InvalidArgument
    );

    let filter = DisplayModeFilter {
        format: xrgb,
        scanline_ordering: ScanlineOrdering::Progressive,
    };
    assert_eq!(d3d.adapter_mode_count_ex(bad, &filter), Err(Error::InvalidArgument));
    assert_eq!(d3d.enum_adapter_modes_ex(bad, &filter, 0), Err(Error::InvalidArgument));
    assert_eq!(d3d.adapter_display_mode_ex(bad), Err(Error::InvalidArgument));
    assert_eq!(d3d.adapter_luid(bad), Err(Error::InvalidArgument));
    assert_eq!(d3d.adapter_count(), bad, "nothing was torn down");
}

#[test]
fn mode_enumeration_checks_render_target_format() {
    let fixture = Fixture::new();
    fixture.driver().rejected_formats.push(Format::R5G6B5);
    let d3d = direct3d_create9(&fixture.system).unwrap();

    assert_eq!(d3d.adapter_mode_count(0, Format::X8R8G8B8), Ok(3));
    assert_eq!(d3d.adapter_mode_count(0, Format::R5G6B5), Ok(0));
    assert_eq!(
        d3d.enum_adapter_modes(0, Format::R5G6B5, 0),
        Err(Error::NotAvailable),
        "driver error passed through"
    );
    assert_eq!(
        d3d.enum_adapter_modes(0, Format::X8R8G8B8, 3),
        Err(Error::InvalidArgument)
    );

    let second = d3d.enum_adapter_modes(0, Format::A8R8G8B8, 1).unwrap();
    assert_eq!((second.width, second.height, second.refresh_rate), (1280, 720, 60));
    assert_eq!(second.format, Format::A8R8G8B8, "reported in the requested format");
}

#[test]
fn extended_enumeration_reports_native_format() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9_ex(&fixture.system).unwrap();
    let filter = DisplayModeFilter {
        format: Format::A8R8G8B8,
        scanline_ordering: ScanlineOrdering::Unknown,
    };
    assert_eq!(d3d.adapter_mode_count_ex(0, &filter), Ok(3));
    let mode = d3d.enum_adapter_modes_ex(0, &filter, 2).unwrap();
    assert_eq!(
        mode,
        ModeDesc {
            width: 800,
            height: 600,
            refresh_rate: 60,
            format: Format::X8R8G8B8,
            scanline_ordering: ScanlineOrdering::Progressive,
        }
    );
}

#[test]
fn failing_mode_query_drops_only_that_mode() {
    let fixture = Fixture::new();
    fixture.windows.state().displays[0].failing_modes.push(1);
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let output = &d3d.topology().groups()[0].outputs()[0];
    assert_eq!(output.modes(), &[mode(1920, 1080), mode(800, 600)]);
    assert_eq!(d3d.adapter_mode_count(0, Format::X8R8G8B8), Ok(2));
}

#[test]
fn display_mode_reads_live_mode() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9_ex(&fixture.system).unwrap();
    let current = d3d.adapter_display_mode(0).unwrap();
    assert_eq!((current.width, current.height), (1920, 1080));
    assert_eq!(current.format, Format::X8R8G8B8);

    fixture.windows.state().displays[0].current = mode(1280, 720);
    let (current, rotation) = d3d.adapter_display_mode_ex(0).unwrap();
    assert_eq!((current.width, current.height), (1280, 720));
    assert_eq!(current.scanline_ordering, ScanlineOrdering::Progressive);
    assert_eq!(rotation, Rotation::Identity);
}

#[test]
fn caps_carry_group_position() {
    let fixture = two_displays();
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let caps = d3d.device_caps(1, DeviceType::Hal).unwrap();
    assert_eq!(caps.master_adapter_ordinal, 0);
    assert_eq!(caps.adapter_ordinal_in_group, 1);
    assert_eq!(caps.number_of_adapters_in_group, 2);
    assert_eq!(caps.max_texture_width, 16384, "driver caps kept");

    assert_eq!(d3d.adapter_monitor(1), Ok(MonitorId(1)));
    assert_eq!(d3d.adapter_identifier(0, 0).unwrap().vendor_id, 0x1002);
    assert_eq!(
        d3d.check_device_multisample_type(0, DeviceType::Hal, Format::X8R8G8B8, true, MultisampleType(4)),
        Err(Error::NotAvailable)
    );
}

#[test]
fn base_factory_uses_base_driver_entry() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let mut params = [windowed()];
    let device = d3d
        .create_device(&request(0, BehaviorFlags::HARDWARE_VERTEXPROCESSING), &mut params)
        .unwrap();

    assert_eq!(device.present_group().multihead_count(), 1);
    assert_eq!(params[0].device_window, Some(FOCUS));
    let driver = fixture.driver();
    assert_eq!((driver.created, driver.created_ex), (1, 0));
}

#[test]
fn extended_factory_uses_extended_driver_entry() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9_ex(&fixture.system).unwrap();
    let mut params = [windowed()];
    let device = d3d
        .create_device_ex(&request(0, BehaviorFlags::HARDWARE_VERTEXPROCESSING), &mut params, None)
        .unwrap();
    assert_eq!(device.present_group().multihead_count(), 1);
    let driver = fixture.driver();
    assert_eq!((driver.created, driver.created_ex), (0, 1));
}

#[test]
fn adapter_group_device_gets_one_head_per_output() {
    let fixture = two_displays();
    fixture.windows.add_window(WindowId(2), 640, 480);
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let behavior = BehaviorFlags::HARDWARE_VERTEXPROCESSING | BehaviorFlags::ADAPTERGROUP_DEVICE;

    assert_eq!(
        d3d.create_device(&request(0, behavior), &mut [windowed()])
            .unwrap_err(),
        Error::InvalidArgument,
        "one parameter block per head"
    );

    let mut params = [
        windowed(),
        PresentParameters {
            device_window: Some(WindowId(2)),
            ..windowed()
        },
    ];
    let device = d3d.create_device(&request(0, behavior), &mut params).unwrap();
    assert_eq!(device.present_group().multihead_count(), 2);
    assert_eq!(fixture.driver().last_heads, 2);
}

#[test]
fn driver_failure_releases_group_and_passes_error() {
    let fixture = Fixture::new();
    fixture.driver().create_error = Some(Error::OutOfResources);
    let d3d = direct3d_create9(&fixture.system).unwrap();

    let err = d3d
        .create_device(&request(0, BehaviorFlags::NONE), &mut [windowed()])
        .unwrap_err();
    assert_eq!(err, Error::OutOfResources);

    let present = fixture.present.state();
    assert!(present.live_contexts.is_empty());
    assert_eq!(present.destroyed_contexts.len(), 1);
    drop(present);
    let backend = fixture.backends.last_backend().unwrap();
    assert_eq!(backend.state().deinit_calls, 1);
}

#[test]
fn device_keeps_group_alive_until_dropped() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let device = d3d
        .create_device(&request(0, BehaviorFlags::NONE), &mut [windowed()])
        .unwrap();
    assert_eq!(device.present_group().ref_count(), 1);
    assert_eq!(fixture.present.state().live_contexts.len(), 1);
    drop(device);
    assert!(fixture.present.state().live_contexts.is_empty());
}

#[test]
fn extended_interface_only_on_extended_factory() {
    let fixture = Fixture::new();
    let base = direct3d_create9(&fixture.system).unwrap();
    assert!(!base.is_ex());
    assert_eq!(base.query_interface(Iid::Direct3D9Ex).unwrap_err(), Error::NoInterface);
    assert_eq!(Direct3D9Ex::from_base(&base).unwrap_err(), Error::NoInterface);
    assert_eq!(base.ref_count(), 1, "failed query leaves the count alone");
    assert!(base.query_interface(Iid::Unknown).unwrap().ptr_eq(&base));
    assert_eq!(base.query_interface(Iid::Present).unwrap_err(), Error::NoInterface);
    assert_eq!(base.register_software_device(), Err(Error::InvalidArgument));

    let ex = direct3d_create9_ex(&fixture.system).unwrap();
    assert!(ex.is_ex());
    let base_view = ex.query_interface(Iid::Direct3D9).unwrap();
    let again = Direct3D9Ex::from_base(&base_view).unwrap();
    assert!(again.ptr_eq(&ex));
    assert_eq!(ex.ref_count(), 3);
}

#[test]
fn last_release_tears_down_backend_once() {
    let fixture = Fixture::new();
    let d3d = direct3d_create9(&fixture.system).unwrap();
    let second = d3d.add_ref();
    assert_eq!(second.ref_count(), 2);
    assert_eq!(second.release(), 1);
    assert_eq!(fixture.backends.dropped_backends(), 0);
    assert_eq!(d3d.release(), 0);
    assert_eq!(fixture.backends.dropped_backends(), 1);
}

#[test]
fn entry_points_need_video_subsystem() {
    let fixture = Fixture::new();
    fixture.windows.state().video_initialized = false;
    assert!(direct3d_create9(&fixture.system).is_none());
    assert_eq!(
        direct3d_create9_ex(&fixture.system).unwrap_err(),
        Error::InvalidArgument
    );
    assert!(fixture.loader.opened().is_empty(), "no probe without video");
}
