// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `Direct3D9` factory and its extended interface.
//!
//! Every per-adapter operation checks the adapter id against the topology
//! before anything else, then delegates to the group's driver adapter or to
//! the window system.

use core::ops::Deref;

use nineport_core::com::{Com, Iid, Unknown};
use nineport_core::error::{Error, Result};
use nineport_core::format::{Format, to_api};
use nineport_core::mode::{DisplayModeFilter, ModeDesc, Rotation, ScanlineOrdering};
use nineport_core::params::{BehaviorFlags, PresentParameters};
use nineport_core::platform::Platform;
use nineport_core::window::{MonitorId, WindowId};
use nineport_present::{GroupConfig, PresentGroup};

use crate::driver::{
    AdapterIdentifier, Caps, Device, DeviceRequest, DeviceType, MultisampleType, ResourceType,
    Usage,
};
use crate::topology::{AdapterGroup, Output, Topology};

/// Locally unique adapter id. Never produced; see
/// [`Direct3D9Ex::adapter_luid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Luid {
    /// Low half.
    pub low: u32,
    /// High half.
    pub high: i32,
}

/// Arguments of [`Direct3D9::create_device`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateDevice {
    /// Absolute adapter id.
    pub adapter: u32,
    /// Requested device kind.
    pub device_type: DeviceType,
    /// Focus window.
    pub focus: Option<WindowId>,
    /// Creation flags.
    pub behavior: BehaviorFlags,
}

/// The adapter factory.
pub struct Direct3D9 {
    topology: Topology,
    platform: Platform,
    driver_version: (u32, u32),
    ex: bool,
}

impl core::fmt::Debug for Direct3D9 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Direct3D9")
            .field("topology", &self.topology)
            .field("driver_version", &self.driver_version)
            .field("ex", &self.ex)
            .finish_non_exhaustive()
    }
}

impl Direct3D9 {
    pub(crate) fn new(
        topology: Topology,
        platform: Platform,
        driver_version: (u32, u32),
        ex: bool,
    ) -> Self {
        Self {
            topology,
            platform,
            driver_version,
            ex,
        }
    }

    fn locate(&self, adapter: u32) -> Result<(&AdapterGroup, &Output)> {
        self.topology
            .locate(adapter)
            .map(|(_, group, output)| (group, output))
    }

    /// The discovered topology.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Whether this factory was created through the extended entry point.
    #[must_use]
    pub fn is_ex(&self) -> bool {
        self.ex
    }

    /// Software devices are not supported.
    ///
    /// # Errors
    ///
    /// Always [`Error::InvalidArgument`].
    pub fn register_software_device(&self) -> Result<()> {
        log::debug!("register_software_device is not supported");
        Err(Error::InvalidArgument)
    }

    /// Number of adapters.
    #[must_use]
    pub fn adapter_count(&self) -> u32 {
        self.topology.adapter_count()
    }

    /// Identification of `adapter`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// error.
    pub fn adapter_identifier(&self, adapter: u32, flags: u32) -> Result<AdapterIdentifier> {
        let (group, _) = self.locate(adapter)?;
        group.adapter().identifier(flags)
    }

    fn check_mode_format(&self, adapter: u32, format: Format) -> Result<()> {
        self.check_device_format(
            adapter,
            DeviceType::Hal,
            format,
            Usage::RENDERTARGET,
            ResourceType::Surface,
            format,
        )
    }

    /// Number of modes of `adapter`, or zero when `format` cannot be a
    /// render target.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter.
    pub fn adapter_mode_count(&self, adapter: u32, format: Format) -> Result<u32> {
        let (_, output) = self.locate(adapter)?;
        if self.check_mode_format(adapter, format).is_err() {
            log::warn!("DeviceFormat not available.");
            return Ok(0);
        }
        let count = u32::try_from(output.modes().len()).unwrap_or(u32::MAX);
        log::trace!("{count} modes.");
        Ok(count)
    }

    /// Mode `mode` of `adapter`, reported in `format`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an unknown adapter or mode.
    /// - The driver's error when `format` cannot be a render target.
    pub fn enum_adapter_modes(&self, adapter: u32, format: Format, mode: u32) -> Result<ModeDesc> {
        let (_, output) = self.locate(adapter)?;
        self.check_mode_format(adapter, format)
            .inspect_err(|_| log::trace!("DeviceFormat not available."))?;
        let found = mode_at(output, mode)?;
        Ok(ModeDesc {
            width: found.width,
            height: found.height,
            refresh_rate: found.refresh_rate,
            format,
            scanline_ordering: ScanlineOrdering::Unknown,
        })
    }

    /// The current mode of the display with the same index as `adapter`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter or when the mode
    /// cannot be read.
    pub fn adapter_display_mode(&self, adapter: u32) -> Result<ModeDesc> {
        self.locate(adapter)?;
        let mode = self
            .platform
            .windows
            .current_display_mode(adapter)
            .map_err(|err| {
                log::debug!("current_display_mode({adapter}) failed: {err}");
                Error::InvalidArgument
            })?;
        Ok(ModeDesc {
            scanline_ordering: ScanlineOrdering::Unknown,
            ..mode.to_desc()
        })
    }

    /// Whether `device_type` can run on `adapter` with these formats.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// answer.
    pub fn check_device_type(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> Result<()> {
        let (group, _) = self.locate(adapter)?;
        group
            .adapter()
            .check_device_type(device_type, adapter_format, back_buffer_format, windowed)
    }

    /// Whether `check_format` is usable for `resource` with `usage`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// answer.
    pub fn check_device_format(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        usage: Usage,
        resource: ResourceType,
        check_format: Format,
    ) -> Result<()> {
        let (group, _) = self.locate(adapter)?;
        group.adapter().check_device_format(
            device_type,
            adapter_format,
            usage,
            resource,
            check_format,
        )
    }

    /// Whether `multisample` is supported; returns the quality level count.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// answer.
    pub fn check_device_multisample_type(
        &self,
        adapter: u32,
        device_type: DeviceType,
        surface_format: Format,
        windowed: bool,
        multisample: MultisampleType,
    ) -> Result<u32> {
        let (group, _) = self.locate(adapter)?;
        group.adapter().check_device_multisample_type(
            device_type,
            surface_format,
            windowed,
            multisample,
        )
    }

    /// Whether the depth-stencil format works with the render target format.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// answer.
    pub fn check_depth_stencil_match(
        &self,
        adapter: u32,
        device_type: DeviceType,
        adapter_format: Format,
        render_target_format: Format,
        depth_stencil_format: Format,
    ) -> Result<()> {
        let (group, _) = self.locate(adapter)?;
        group.adapter().check_depth_stencil_match(
            device_type,
            adapter_format,
            render_target_format,
            depth_stencil_format,
        )
    }

    /// Whether the hardware converts between the two formats.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// answer.
    pub fn check_device_format_conversion(
        &self,
        adapter: u32,
        device_type: DeviceType,
        source_format: Format,
        target_format: Format,
    ) -> Result<()> {
        let (group, _) = self.locate(adapter)?;
        group
            .adapter()
            .check_device_format_conversion(device_type, source_format, target_format)
    }

    /// Driver caps with the adapter's place in its group filled in.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter, else the driver's
    /// error.
    pub fn device_caps(&self, adapter: u32, device_type: DeviceType) -> Result<Caps> {
        let (entry, group, _) = self.topology.locate(adapter)?;
        let caps = group.adapter().device_caps(device_type)?;
        Ok(Caps {
            master_adapter_ordinal: entry.master,
            adapter_ordinal_in_group: adapter - entry.master,
            number_of_adapters_in_group: u32::try_from(group.outputs().len())
                .unwrap_or(u32::MAX),
            ..caps
        })
    }

    /// The monitor `adapter` drives.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unknown adapter.
    pub fn adapter_monitor(&self, adapter: u32) -> Result<MonitorId> {
        let (_, output) = self.locate(adapter)?;
        Ok(output.monitor())
    }

    /// Creates a device on the base interface.
    ///
    /// `params` holds one entry per head: the group's output count with
    /// [`BehaviorFlags::ADAPTERGROUP_DEVICE`], else one. Extra entries are
    /// ignored. Resolved values are written back.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an unknown adapter or too few
    ///   parameter entries.
    /// - Any error from building the presentation group.
    /// - The driver's error, unchanged; the group is released first.
    pub fn create_device(
        &self,
        request: &CreateDevice,
        params: &mut [PresentParameters],
    ) -> Result<Box<dyn Device>> {
        self.create_device_inner(request, params, None)
    }

    fn create_device_inner(
        &self,
        request: &CreateDevice,
        params: &mut [PresentParameters],
        fullscreen_modes: Option<&[ModeDesc]>,
    ) -> Result<Box<dyn Device>> {
        let (group, _) = self.locate(request.adapter)?;

        let heads = if request.behavior.contains(BehaviorFlags::ADAPTERGROUP_DEVICE) {
            group.outputs().len()
        } else {
            1
        };
        let given = params.len();
        let Some(params) = params.get_mut(..heads) else {
            log::error!("{heads} presentation parameter blocks needed, {given} given.");
            return Err(Error::InvalidArgument);
        };
        let fullscreen_modes = match fullscreen_modes {
            Some(modes) => Some(modes.get(..heads).ok_or(Error::InvalidArgument)?),
            None => None,
        };

        let config = GroupConfig {
            focus: request.focus,
            ex: self.ex,
            behavior: request.behavior,
            driver_version: self.driver_version,
        };
        let present = PresentGroup::new(
            &self.platform,
            group.backend().clone(),
            &config,
            params,
            fullscreen_modes,
        )
        .inspect_err(|_| log::warn!("Failed to create PresentGroup."))?;

        let device_request = DeviceRequest {
            adapter: request.adapter,
            device_type: request.device_type,
            focus: request.focus,
            behavior: request.behavior,
            params: &*params,
            fullscreen_modes,
        };
        let device = if self.ex {
            group.adapter().create_device_ex(&device_request, &present)
        } else {
            group.adapter().create_device(&device_request, &present)
        };
        match device {
            Ok(device) => Ok(device),
            Err(err) => {
                log::warn!("Driver device creation failed: {err}");
                present.release();
                Err(err)
            }
        }
    }
}

fn mode_at(output: &Output, mode: u32) -> Result<nineport_core::mode::DisplayMode> {
    usize::try_from(mode)
        .ok()
        .and_then(|index| output.modes().get(index))
        .copied()
        .ok_or_else(|| {
            log::warn!("Mode {mode} does not exist.");
            Error::InvalidArgument
        })
}

impl Unknown for Direct3D9 {
    const NAME: &'static str = "Direct3D9";

    fn supports(&self, iid: Iid) -> bool {
        match iid {
            Iid::Direct3D9 => true,
            Iid::Direct3D9Ex => self.ex,
            _ => false,
        }
    }
}

/// A factory handle known to implement the extended interface.
#[derive(Debug)]
pub struct Direct3D9Ex(Com<Direct3D9>);

impl Direct3D9Ex {
    /// Queries `base` for the extended interface.
    ///
    /// # Errors
    ///
    /// [`Error::NoInterface`] when `base` came from the base entry point.
    pub fn from_base(base: &Com<Direct3D9>) -> Result<Self> {
        base.query_interface(Iid::Direct3D9Ex).map(Self)
    }

    /// The base interface handle.
    #[must_use]
    pub fn into_base(self) -> Com<Direct3D9> {
        self.0
    }

    /// Number of modes matching `filter`.
    ///
    /// Only the filter's format is considered.
    ///
    /// # Errors
    ///
    /// As for [`Direct3D9::adapter_mode_count`].
    pub fn adapter_mode_count_ex(&self, adapter: u32, filter: &DisplayModeFilter) -> Result<u32> {
        self.adapter_mode_count(adapter, filter.format)
    }

    /// Mode `mode` of `adapter`, reported in its own format.
    ///
    /// # Errors
    ///
    /// As for [`Direct3D9::enum_adapter_modes`].
    pub fn enum_adapter_modes_ex(
        &self,
        adapter: u32,
        filter: &DisplayModeFilter,
        mode: u32,
    ) -> Result<ModeDesc> {
        let (_, output) = self.locate(adapter)?;
        self.check_mode_format(adapter, filter.format)
            .inspect_err(|_| log::trace!("DeviceFormat not available."))?;
        let found = mode_at(output, mode)?;
        Ok(ModeDesc {
            width: found.width,
            height: found.height,
            refresh_rate: found.refresh_rate,
            format: to_api(found.format),
            scanline_ordering: ScanlineOrdering::Progressive,
        })
    }

    /// The current mode of the display with the same index as `adapter`,
    /// plus its rotation.
    ///
    /// # Errors
    ///
    /// As for [`Direct3D9::adapter_display_mode`].
    pub fn adapter_display_mode_ex(&self, adapter: u32) -> Result<(ModeDesc, Rotation)> {
        let mode = self.adapter_display_mode(adapter)?;
        Ok((
            ModeDesc {
                scanline_ordering: ScanlineOrdering::Progressive,
                ..mode
            },
            Rotation::Identity,
        ))
    }

    /// Creates a device on the extended interface.
    ///
    /// `fullscreen_modes`, when given, holds one mode per head.
    ///
    /// # Errors
    ///
    /// As for [`Direct3D9::create_device`].
    pub fn create_device_ex(
        &self,
        request: &CreateDevice,
        params: &mut [PresentParameters],
        fullscreen_modes: Option<&[ModeDesc]>,
    ) -> Result<Box<dyn Device>> {
        self.create_device_inner(request, params, fullscreen_modes)
    }

    /// Adapter LUIDs are not supported.
    ///
    /// # Errors
    ///
    /// Always [`Error::InvalidArgument`].
    pub fn adapter_luid(&self, adapter: u32) -> Result<Luid> {
        log::debug!("adapter_luid({adapter}) is not supported");
        Err(Error::InvalidArgument)
    }
}

impl Deref for Direct3D9Ex {
    type Target = Com<Direct3D9>;

    fn deref(&self) -> &Com<Direct3D9> {
        &self.0
    }
}
