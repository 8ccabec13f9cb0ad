// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts implemented by the vendor `d3dadapter9` module.
//!
//! A [`ModuleLoader`] opens the module and yields a [`DriverModule`]. The
//! module binds one [`AdapterDriver`] to each backend device descriptor; the
//! adapter answers capability queries and builds [`Device`]s that present
//! through a [`PresentGroup`].

use core::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use nineport_core::com::Com;
use nineport_core::error::{PlatformError, Result};
use nineport_core::format::Format;
use nineport_core::mode::ModeDesc;
use nineport_core::params::{BehaviorFlags, PresentParameters};
use nineport_core::window::WindowId;
use nineport_present::PresentGroup;
use rustix::fd::BorrowedFd;

/// Kind of device to create or query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    /// Hardware rasterization.
    #[default]
    Hal,
    /// Reference rasterizer.
    Ref,
    /// Pluggable software rasterizer.
    Sw,
    /// Reference device without rendering.
    NullRef,
}

/// Resource usage bits for format checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Usage(pub u32);

impl Usage {
    /// Usable as a render target.
    pub const RENDERTARGET: Self = Self(0x0000_0001);
    /// Usable as a depth-stencil buffer.
    pub const DEPTHSTENCIL: Self = Self(0x0000_0002);
    /// Dynamic resource.
    pub const DYNAMIC: Self = Self(0x0000_0200);
}

/// Resource kind for format checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A plain surface.
    Surface,
    /// A volume.
    Volume,
    /// A 2D texture.
    Texture,
    /// A volume texture.
    VolumeTexture,
    /// A cube texture.
    CubeTexture,
    /// A vertex buffer.
    VertexBuffer,
    /// An index buffer.
    IndexBuffer,
}

/// Multisample sample count; zero is none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct MultisampleType(pub u32);

impl MultisampleType {
    /// No multisampling.
    pub const NONE: Self = Self(0);
}

/// Identification strings and ids of an adapter.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AdapterIdentifier {
    /// Driver file name.
    pub driver: String,
    /// Human-readable adapter description.
    pub description: String,
    /// Display device name.
    pub device_name: String,
    /// Packed driver version.
    pub driver_version: u64,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// PCI device id.
    pub device_id: u32,
    /// PCI subsystem id.
    pub sub_sys_id: u32,
    /// PCI revision.
    pub revision: u32,
    /// WHQL certification level.
    pub whql_level: u32,
}

/// Device capabilities.
///
/// Drivers fill everything but the three group fields, which the factory
/// sets from the adapter map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Caps {
    /// Device kind the caps describe.
    pub device_type: DeviceType,
    /// Adapter ordinal as the driver sees it.
    pub adapter_ordinal: u32,
    /// Driver caps bits.
    pub caps: u32,
    /// Second set of caps bits.
    pub caps2: u32,
    /// Third set of caps bits.
    pub caps3: u32,
    /// Supported presentation interval bits.
    pub presentation_intervals: u32,
    /// Largest texture width.
    pub max_texture_width: u32,
    /// Largest texture height.
    pub max_texture_height: u32,
    /// Vertex shader version token.
    pub vertex_shader_version: u32,
    /// Pixel shader version token.
    pub pixel_shader_version: u32,
    /// Absolute id of the group's master adapter.
    pub master_adapter_ordinal: u32,
    /// Offset of this adapter in its group.
    pub adapter_ordinal_in_group: u32,
    /// Number of adapters in the group.
    pub number_of_adapters_in_group: u32,
}

/// Everything a driver needs to build a device.
#[derive(Clone, Copy, Debug)]
pub struct DeviceRequest<'a> {
    /// Absolute adapter id.
    pub adapter: u32,
    /// Requested device kind.
    pub device_type: DeviceType,
    /// Focus window.
    pub focus: Option<WindowId>,
    /// Creation flags.
    pub behavior: BehaviorFlags,
    /// Resolved parameters, one per head.
    pub params: &'a [PresentParameters],
    /// Fullscreen modes, one per head, extended interface only.
    pub fullscreen_modes: Option<&'a [ModeDesc]>,
}

/// A device built by the driver.
pub trait Device: Debug + Send + Sync {
    /// The group this device presents through.
    fn present_group(&self) -> &Com<PresentGroup>;
}

/// The driver side of one adapter group.
///
/// Capability checks return `Ok(())` when supported and the driver's error
/// otherwise.
pub trait AdapterDriver: Debug + Send + Sync {
    /// Identification of the adapter.
    fn identifier(&self, flags: u32) -> Result<AdapterIdentifier>;

    /// Whether `device_type` can run with these formats.
    fn check_device_type(
        &self,
        device_type: DeviceType,
        adapter_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> Result<()>;

    /// Whether `check_format` is usable for `resource` with `usage`.
    fn check_device_format(
        &self,
        device_type: DeviceType,
        adapter_format: Format,
        usage: Usage,
        resource: ResourceType,
        check_format: Format,
    ) -> Result<()>;

    /// Whether `multisample` is supported; returns the quality level count.
    fn check_device_multisample_type(
        &self,
        device_type: DeviceType,
        surface_format: Format,
        windowed: bool,
        multisample: MultisampleType,
    ) -> Result<u32>;

    /// Whether the depth-stencil format works with the render target format.
    fn check_depth_stencil_match(
        &self,
        device_type: DeviceType,
        adapter_format: Format,
        render_target_format: Format,
        depth_stencil_format: Format,
    ) -> Result<()>;

    /// Whether the hardware converts between the two formats.
    fn check_device_format_conversion(
        &self,
        device_type: DeviceType,
        source_format: Format,
        target_format: Format,
    ) -> Result<()>;

    /// Device capabilities.
    fn device_caps(&self, device_type: DeviceType) -> Result<Caps>;

    /// Builds a device for the base interface.
    ///
    /// The driver takes its own reference to `group` if it keeps it.
    fn create_device(
        &self,
        request: &DeviceRequest<'_>,
        group: &Com<PresentGroup>,
    ) -> Result<Box<dyn Device>>;

    /// Builds a device for the extended interface.
    fn create_device_ex(
        &self,
        request: &DeviceRequest<'_>,
        group: &Com<PresentGroup>,
    ) -> Result<Box<dyn Device>>;
}

/// A loaded vendor module.
pub trait DriverModule: Debug + Send + Sync {
    /// The module's `(major, minor)` version.
    fn version(&self) -> (u32, u32);

    /// Binds an adapter to an open device descriptor.
    fn create_adapter(&self, fd: BorrowedFd<'_>) -> Result<Box<dyn AdapterDriver>>;
}

/// Opens vendor modules.
pub trait ModuleLoader: Send + Sync {
    /// Loads the module at `path` and resolves its DRM entry point.
    ///
    /// The error carries the loader's message.
    fn open(&self, path: &Path) -> Result<Arc<dyn DriverModule>, PlatformError>;
}
