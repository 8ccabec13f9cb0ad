// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter topology: groups of outputs, their modes, and the absolute
//! adapter id map.
//!
//! Discovery runs once per factory and the result is immutable afterwards.
//!
//! ```text
//!   Topology
//!   ├── map: [ {group 0, master 0}, {group 0, master 0}, {group 1, master 2} ]
//!   └── groups
//!       ├── 0: adapter, backend, outputs [ modes.. ], [ modes.. ]
//!       └── 1: adapter, backend, outputs [ modes.. ]
//! ```
//!
//! Sequences grow by doubling from small initial capacities. During
//! discovery an entry is only ever dropped while it is the last one
//! appended.

use std::sync::Arc;

use nineport_core::backend::{Backend, BackendProvider};
use nineport_core::error::{Error, Result};
use nineport_core::mode::DisplayMode;
use nineport_core::window::{MonitorId, WindowSystem};

use crate::driver::{AdapterDriver, DriverModule};

const INITIAL_GROUPS: usize = 2;
const INITIAL_OUTPUTS: usize = 2;
const INITIAL_MODES: usize = 8;

/// Backend devices exposed as adapter groups.
const BACKEND_DEVICES: usize = 1;

/// One attached display, as seen at discovery time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    modes: Vec<DisplayMode>,
    monitor: MonitorId,
}

impl Output {
    /// Modes reported at discovery, in report order.
    #[must_use]
    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    /// The display this output stands for.
    #[must_use]
    pub fn monitor(&self) -> MonitorId {
        self.monitor
    }
}

/// Outputs driven by one backend device and its driver adapter.
// Field order is teardown order.
pub struct AdapterGroup {
    outputs: Vec<Output>,
    adapter: Box<dyn AdapterDriver>,
    backend: Arc<dyn Backend>,
}

impl core::fmt::Debug for AdapterGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdapterGroup")
            .field("outputs", &self.outputs)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl AdapterGroup {
    /// Outputs in adapter-id order.
    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// The driver adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn AdapterDriver {
        self.adapter.as_ref()
    }

    /// The backend shared by every surface presenting on this group.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}

/// Where an absolute adapter id lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AdapterMapEntry {
    /// Index into [`Topology::groups`].
    pub group: usize,
    /// Absolute id of the first adapter of the group.
    pub master: u32,
}

/// Every adapter group and the absolute id map.
// Field order is teardown order.
#[derive(Debug)]
pub struct Topology {
    map: Vec<AdapterMapEntry>,
    groups: Vec<AdapterGroup>,
}

impl Topology {
    /// Discovers adapters for every backend device.
    ///
    /// A group whose backend cannot be acquired, or whose driver adapter
    /// cannot be created, is dropped and discovery goes on.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfResources`] when a sequence cannot grow.
    /// - [`Error::NotAvailable`] when no adapter remains.
    pub fn discover(
        windows: &dyn WindowSystem,
        backends: &dyn BackendProvider,
        module: &dyn DriverModule,
    ) -> Result<Self> {
        let mut groups = Vec::new();
        for device in 0..BACKEND_DEVICES {
            reserve_one(&mut groups, INITIAL_GROUPS)?;

            let screen = backends.default_screen();
            let Some(backend) = backends.acquire(screen) else {
                log::error!("Unable to open backend for display {device}.");
                continue;
            };

            let adapter = match create_adapter(module, backend.as_ref()) {
                Ok(adapter) => adapter,
                Err(err) => {
                    log::error!("Unable to create driver adapter for display {device}: {err}");
                    continue;
                }
            };

            let outputs = discover_outputs(windows)?;
            groups.push(AdapterGroup {
                outputs,
                adapter,
                backend,
            });
        }

        let adapter_count: usize = groups.iter().map(|group| group.outputs.len()).sum();
        if adapter_count == 0 {
            log::error!("No available native adapters in system.");
            return Err(Error::NotAvailable);
        }

        let mut map = Vec::new();
        map.try_reserve_exact(adapter_count)
            .map_err(|_| out_of_memory())?;
        for (group_index, group) in groups.iter().enumerate() {
            let master = u32::try_from(map.len()).map_err(|_| Error::OutOfResources)?;
            for _ in &group.outputs {
                map.push(AdapterMapEntry {
                    group: group_index,
                    master,
                });
            }
        }

        log::debug!(
            "Discovered {} adapter(s) in {} group(s).",
            map.len(),
            groups.len()
        );
        Ok(Self { map, groups })
    }

    /// Total number of adapters.
    #[must_use]
    pub fn adapter_count(&self) -> u32 {
        u32::try_from(self.map.len()).unwrap_or(u32::MAX)
    }

    /// Every group, in discovery order.
    #[must_use]
    pub fn groups(&self) -> &[AdapterGroup] {
        &self.groups
    }

    /// The absolute id map.
    #[must_use]
    pub fn map(&self) -> &[AdapterMapEntry] {
        &self.map
    }

    /// The map entry, group, and output of `adapter`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `adapter` is out of range.
    pub fn locate(&self, adapter: u32) -> Result<(AdapterMapEntry, &AdapterGroup, &Output)> {
        let entry = usize::try_from(adapter)
            .ok()
            .and_then(|index| self.map.get(index))
            .copied()
            .ok_or(Error::InvalidArgument)?;
        let group = self.groups.get(entry.group).ok_or(Error::InvalidArgument)?;
        let offset = usize::try_from(adapter - entry.master).map_err(|_| Error::InvalidArgument)?;
        let output = group.outputs.get(offset).ok_or(Error::InvalidArgument)?;
        Ok((entry, group, output))
    }
}

fn out_of_memory() -> Error {
    log::error!("Out of memory.");
    Error::OutOfResources
}

/// Makes room for one more element, doubling capacity once it is full.
fn reserve_one<T>(items: &mut Vec<T>, initial: usize) -> Result<()> {
    if items.len() < items.capacity() {
        return Ok(());
    }
    let additional = if items.capacity() == 0 {
        initial
    } else {
        items.capacity()
    };
    items
        .try_reserve_exact(additional)
        .map_err(|_| out_of_memory())
}

fn create_adapter(module: &dyn DriverModule, backend: &dyn Backend) -> Result<Box<dyn AdapterDriver>> {
    let Some(fd) = backend.fd() else {
        log::error!("Got invalid fd from backend");
        return Err(Error::DriverInternal);
    };
    let adapter = module.create_adapter(fd)?;
    log::trace!("Created driver adapter with fd {fd:?}");
    Ok(adapter)
}

fn discover_outputs(windows: &dyn WindowSystem) -> Result<Vec<Output>> {
    let displays = windows.num_video_displays().unwrap_or_else(|err| {
        log::warn!("Unable to count displays: {err}");
        0
    });

    let mut outputs = Vec::new();
    for display in 0..displays {
        reserve_one(&mut outputs, INITIAL_OUTPUTS)?;

        let count = windows.num_display_modes(display).unwrap_or_else(|err| {
            log::warn!("Unable to count modes for display {display}: {err}");
            0
        });
        let mut modes = Vec::new();
        for index in 0..count {
            reserve_one(&mut modes, INITIAL_MODES)?;
            match windows.display_mode(display, index) {
                Ok(mode) => {
                    log::trace!(
                        "format={:?}, w={}, h={}, refresh_rate={}",
                        mode.format,
                        mode.width,
                        mode.height,
                        mode.refresh_rate
                    );
                    modes.push(mode);
                }
                Err(err) => {
                    log::warn!("Unable to get display mode for display {display}, mode {index}: {err}");
                }
            }
        }

        outputs.push(Output {
            modes,
            monitor: MonitorId(display),
        });
    }
    Ok(outputs)
}
