// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-window presentation surface.
//!
//! A surface holds the current presentation parameters for one window and
//! drives the buffer cycle:
//!
//! ```text
//!   buffer_from_dmabuf ─► present_buffer ─► wait_buffer_released ─┐
//!                              ▲                                  │
//!                              └──────────── reuse ◄──────────────┘
//!                                             │
//!                                     destroy_buffer
//! ```
//!
//! Presenting an [`ImportedBuffer`] again before its release was observed is
//! a caller error; the surface does not serialize it.
//!
//! Parameter state sits behind a mutex. Blocking waits and submits run
//! without holding it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use nineport_core::backend::{Backend, DmaBuf, PixmapHandle};
use nineport_core::com::{Iid, Unknown};
use nineport_core::error::{Error, PlatformError, Result};
use nineport_core::format::to_native;
use nineport_core::geometry::{Point, Rect, Region};
use nineport_core::mode::{DisplayMode, ModeDesc, Rotation};
use nineport_core::params::{PresentParameters, PresentParameters2};
use nineport_core::platform::Platform;
use nineport_core::present::{PresentContext, ReleaseToken, SubmitOptions};
use nineport_core::window::{CursorHandle, CursorImage, GammaRamp, WindowId, WindowSystem};

use crate::flags::DerivedFlags;
use crate::raster::{RasterStatus, raster_status};
use crate::version::{PresentFeature, PresentVersion};

/// Window depth reported by [`PresentSurface::window_info`].
const WINDOW_DEPTH: u32 = 24;

/// Name given to threads spawned by [`PresentSurface::create_thread`].
pub const THREAD_NAME: &str = "D3D9 Thread";

/// A backend buffer imported for presentation.
///
/// Owned by the caller from [`PresentSurface::buffer_from_dmabuf`] until it is
/// handed back to [`PresentSurface::destroy_buffer`]. Dropping it without
/// destroying it leaks the pixmap.
#[derive(Debug)]
pub struct ImportedBuffer {
    pixmap: PixmapHandle,
    token: ReleaseToken,
    width: u32,
    height: u32,
    depth: u32,
}

impl ImportedBuffer {
    /// The backend pixmap.
    #[must_use]
    pub fn pixmap(&self) -> PixmapHandle {
        self.pixmap
    }

    /// The release-tracking token.
    #[must_use]
    pub fn token(&self) -> ReleaseToken {
        self.token
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color depth in bits.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// Size and depth of a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowInfo {
    /// Client width.
    pub width: u32,
    /// Client height.
    pub height: u32,
    /// Color depth in bits.
    pub depth: u32,
}

/// Presentation statistics. Never produced; see
/// [`PresentSurface::present_stats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PresentStats {
    /// Number of presents.
    pub present_count: u32,
    /// Refresh count at the last present.
    pub present_refresh_count: u32,
    /// Refresh count at the last sync.
    pub sync_refresh_count: u32,
    /// Counter value at the last sync.
    pub sync_counter: u64,
}

/// Group-wide settings every surface in a group shares.
#[derive(Clone)]
pub(crate) struct SurfaceSetup {
    pub(crate) platform: Platform,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) version: PresentVersion,
    pub(crate) ex: bool,
    pub(crate) no_window_changes: bool,
}

#[derive(Debug, Default)]
struct SurfaceState {
    params: PresentParameters,
    params2: PresentParameters2,
    flags: DerivedFlags,
    cursor: Option<CursorHandle>,
}

/// Presents buffers into one window.
pub struct PresentSurface {
    platform: Platform,
    backend: Arc<dyn Backend>,
    version: PresentVersion,
    focus: Option<WindowId>,
    ex: bool,
    no_window_changes: bool,
    context: PresentContext,
    state: Mutex<SurfaceState>,
}

impl core::fmt::Debug for PresentSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PresentSurface")
            .field("version", &self.version)
            .field("focus", &self.focus)
            .field("ex", &self.ex)
            .field("no_window_changes", &self.no_window_changes)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn driver_error(what: &str, err: &PlatformError) -> Error {
    log::error!("{what} failed with error {err}");
    Error::DriverInternal
}

impl PresentSurface {
    /// Builds a surface: applies `params`, then creates the extension
    /// tracking state, then initializes the backend.
    ///
    /// Needs a focus window or a device window. A missing device window
    /// defaults to the focus window and is written back into `params`.
    pub(crate) fn create(
        setup: &SurfaceSetup,
        focus: Option<WindowId>,
        params: &mut PresentParameters,
        fullscreen_mode: Option<&ModeDesc>,
    ) -> Result<Self> {
        if focus.is_none() && params.device_window.is_none() {
            log::error!("No focus window specified for presentation surface.");
            return Err(Error::InvalidArgument);
        }
        if params.device_window.is_none() {
            params.device_window = focus;
        }

        let mut state = SurfaceState::default();
        configure(
            setup.platform.windows.as_ref(),
            setup.ex,
            setup.no_window_changes,
            &mut state,
            params,
            fullscreen_mode,
        )?;

        let Some(context) = setup.platform.present.init() else {
            log::error!("Failed to init present extension state.");
            return Err(Error::DriverInternal);
        };

        if !setup.backend.init() {
            log::error!("Failed to init backend.");
            setup.platform.present.destroy(context);
            return Err(Error::DriverInternal);
        }

        Ok(Self {
            platform: setup.platform.clone(),
            backend: Arc::clone(&setup.backend),
            version: setup.version,
            focus,
            ex: setup.ex,
            no_window_changes: setup.no_window_changes,
            context,
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn windows(&self) -> &dyn WindowSystem {
        self.platform.windows.as_ref()
    }

    fn draw_window(&self) -> Option<WindowId> {
        self.state().params.device_window.or(self.focus)
    }

    /// The negotiated protocol version.
    #[must_use]
    pub fn version(&self) -> PresentVersion {
        self.version
    }

    /// A copy of the current presentation parameters.
    #[must_use]
    pub fn parameters(&self) -> PresentParameters {
        self.state().params
    }

    /// The current derived submit flags.
    #[must_use]
    pub fn derived_flags(&self) -> DerivedFlags {
        self.state().flags
    }

    /// Reconfigures the surface.
    ///
    /// Resolved values (device window, zero back-buffer dimensions) are
    /// written back into `params`. On failure the previous parameters stay in
    /// effect.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the target window cannot be resolved,
    ///   or a fullscreen request leaves a dimension at zero.
    /// - [`Error::DriverInternal`] when the mode or fullscreen switch fails.
    pub fn set_parameters(
        &self,
        params: &mut PresentParameters,
        fullscreen_mode: Option<&ModeDesc>,
    ) -> Result<()> {
        let mut state = self.state();
        configure(
            self.windows(),
            self.ex,
            self.no_window_changes,
            &mut state,
            params,
            fullscreen_mode,
        )
    }

    /// Imports a shared buffer. The caller owns the result.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the backend rejects the import or the
    /// extension cannot track the pixmap.
    pub fn buffer_from_dmabuf(&self, buffer: &DmaBuf<'_>) -> Result<ImportedBuffer> {
        let Some(pixmap) = self.backend.pixmap_from_dmabuf(buffer) else {
            log::error!("pixmap_from_dmabuf failed");
            return Err(Error::DriverInternal);
        };
        let Some(token) = self.platform.present.track_pixmap(
            self.context,
            pixmap,
            buffer.width,
            buffer.height,
            buffer.depth,
        ) else {
            log::error!("Failed to track pixmap {pixmap:?}");
            self.backend.destroy_pixmap(pixmap);
            return Err(Error::DriverInternal);
        };
        Ok(ImportedBuffer {
            pixmap,
            token,
            width: buffer.width,
            height: buffer.height,
            depth: buffer.depth,
        })
    }

    /// Stops release tracking and frees the pixmap. Valid whether or not the
    /// buffer was ever presented.
    pub fn destroy_buffer(&self, buffer: ImportedBuffer) {
        self.platform.present.try_free(buffer.token);
        self.backend.destroy_pixmap(buffer.pixmap);
    }

    /// Blocks until the display server has released `buffer`.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the wait fails.
    pub fn wait_buffer_released(&self, buffer: &ImportedBuffer) -> Result<()> {
        if self.platform.present.wait_released(buffer.token) {
            Ok(())
        } else {
            log::error!("wait_released failed for {:?}", buffer.token);
            Err(Error::DriverInternal)
        }
    }

    /// Copies the current front buffer into `buffer`.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the backend copy fails.
    pub fn front_buffer_copy(&self, buffer: &ImportedBuffer) -> Result<()> {
        if self.backend.copy_front(buffer.pixmap) {
            Ok(())
        } else {
            Err(Error::DriverInternal)
        }
    }

    /// Queues `buffer` for display.
    ///
    /// The target is `window_override`, else the device window, else the
    /// focus window. `flags` are the application's present flags; they do not
    /// change how the buffer is submitted.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the window has no drawable, or prepare
    /// or submit fails. Parameters are untouched either way.
    pub fn present_buffer(
        &self,
        buffer: &ImportedBuffer,
        window_override: Option<WindowId>,
        source: Option<Rect>,
        destination: Option<Rect>,
        dirty: Option<&Region>,
        flags: u32,
    ) -> Result<()> {
        let (device_window, derived) = {
            let state = self.state();
            (state.params.device_window, state.flags)
        };
        let Some(window) = window_override.or(device_window).or(self.focus) else {
            return Err(Error::DriverInternal);
        };
        let native = self
            .windows()
            .native_window(window)
            .map_err(|err| driver_error("native_window", &err))?;

        if !self.platform.present.prepare(native, buffer.token) {
            log::error!("Present prepare call failed");
            return Err(Error::DriverInternal);
        }

        self.backend.present_pixmap(buffer.pixmap);

        let options = SubmitOptions {
            interval: derived.interval,
            async_present: derived.async_present,
            force_copy: derived.force_copy,
            source,
            destination,
            dirty,
        };
        if !self.platform.present.submit(native, buffer.token, &options) {
            log::trace!("Present call failed (flags {flags:#x})");
            return Err(Error::DriverInternal);
        }
        Ok(())
    }

    /// Emulated raster status for the device window's display.
    ///
    /// This is synthesized from the performance counter; see
    /// [`raster_status`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the window's display mode is unknown.
    pub fn raster_status(&self) -> Result<RasterStatus> {
        let counter = self.windows().performance_counter();
        let frequency = self.windows().performance_frequency();
        let mode = self.device_display_mode().map_err(|err| {
            log::debug!("window_display_mode failed: {err}");
            Error::InvalidArgument
        })?;
        log::trace!("refresh_rate={}, height={}", mode.refresh_rate, mode.height);
        let status = raster_status(counter, frequency, mode.refresh_rate, mode.height);
        log::trace!(
            "Returning fake value, in_vblank {}, scanline {}.",
            status.in_vblank,
            status.scanline
        );
        Ok(status)
    }

    fn device_display_mode(&self) -> core::result::Result<DisplayMode, PlatformError> {
        let window = self
            .draw_window()
            .ok_or_else(|| PlatformError::new("no device window"))?;
        self.windows().window_display_mode(window)
    }

    /// The device window's display mode and rotation.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the mode cannot be read.
    pub fn display_mode(&self) -> Result<(ModeDesc, Rotation)> {
        let mode = self
            .device_display_mode()
            .map_err(|err| driver_error("window_display_mode", &err))?;
        Ok((mode.to_desc(), Rotation::Identity))
    }

    /// Presentation statistics are not tracked.
    ///
    /// # Errors
    ///
    /// Always [`Error::InvalidArgument`].
    pub fn present_stats(&self) -> Result<PresentStats> {
        log::debug!("present_stats is not supported");
        Err(Error::InvalidArgument)
    }

    /// Global pointer position.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the position cannot be read.
    pub fn cursor_pos(&self) -> Result<Point> {
        self.windows()
            .global_mouse_state()
            .map_err(|err| driver_error("global_mouse_state", &err))
    }

    /// Moves the pointer.
    ///
    /// From protocol 1.4 a warp to the current position is skipped. After the
    /// warp the position is read back; if it does not match, the pointer is
    /// hidden rather than left in the wrong place.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the warp fails or lands elsewhere.
    pub fn set_cursor_pos(&self, position: Point) -> Result<()> {
        let windows = self.windows();
        if self.version.supports(PresentFeature::CursorPositionCheck)
            && windows.global_mouse_state().ok() == Some(position)
        {
            return Ok(());
        }

        let landed = windows
            .warp_mouse_global(position)
            .and_then(|()| windows.global_mouse_state());
        match landed {
            Ok(actual) if actual == position => Ok(()),
            Ok(actual) => {
                log::warn!("Pointer landed at {actual:?} instead of {position:?}; hiding it");
                windows.show_cursor(false);
                Err(Error::DriverInternal)
            }
            Err(err) => {
                windows.show_cursor(false);
                Err(driver_error("warp_mouse_global", &err))
            }
        }
    }

    /// Replaces the cursor image and sets its visibility.
    ///
    /// `bitmap` is a 32×32 RGBA image and requires a hotspot. With no bitmap
    /// only the visibility changes. A rejected bitmap leaves the previous
    /// cursor and visibility untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a bitmap without a hotspot.
    /// - [`Error::DriverInternal`] when the bitmap is malformed or the cursor
    ///   cannot be created.
    pub fn set_cursor(
        &self,
        bitmap: Option<&[u8]>,
        hotspot: Option<Point>,
        show: bool,
    ) -> Result<()> {
        let windows = self.windows();
        let mut state = self.state();
        if let Some(bitmap) = bitmap {
            let Some(hotspot) = hotspot else {
                return Err(Error::InvalidArgument);
            };
            let Some(image) = CursorImage::from_rgba(bitmap) else {
                log::error!("Cursor bitmap is {} bytes, not 32x32 RGBA", bitmap.len());
                return Err(Error::DriverInternal);
            };
            let cursor = windows
                .create_color_cursor(&image, hotspot)
                .map_err(|err| driver_error("create_color_cursor", &err))?;
            if let Some(previous) = state.cursor.replace(cursor) {
                windows.free_cursor(previous);
            }
        }
        windows.set_cursor(state.cursor);
        windows.show_cursor(show);
        Ok(())
    }

    /// Applies a gamma ramp to `window_override` or the device window.
    ///
    /// # Errors
    ///
    /// [`Error::DriverInternal`] when the platform rejects the ramp.
    pub fn set_gamma_ramp(&self, ramp: &GammaRamp, window_override: Option<WindowId>) -> Result<()> {
        let window = window_override
            .or_else(|| self.draw_window())
            .ok_or(Error::InvalidArgument)?;
        self.windows()
            .set_window_gamma_ramp(window, ramp)
            .map_err(|err| driver_error("set_window_gamma_ramp", &err))
    }

    /// Size and depth of `window`, or of the device window.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the window is unknown.
    pub fn window_info(&self, window: Option<WindowId>) -> Result<WindowInfo> {
        let window = window
            .or_else(|| self.draw_window())
            .ok_or(Error::InvalidArgument)?;
        let (width, height) = self
            .windows()
            .window_size(window)
            .ok_or(Error::InvalidArgument)?;
        Ok(WindowInfo {
            width,
            height,
            depth: WINDOW_DEPTH,
        })
    }

    /// Whether the focus window is minimized. Protocol 1.1.
    ///
    /// # Errors
    ///
    /// [`Error::NotAvailable`] below protocol 1.1.
    pub fn window_occluded(&self) -> Result<bool> {
        self.version.require(PresentFeature::WindowOccluded)?;
        Ok(self
            .focus
            .is_some_and(|focus| self.windows().window_minimized(focus)))
    }

    /// Whether the display mode drifted away from the back-buffer size.
    /// Protocol 1.2.
    ///
    /// Only fullscreen surfaces on the base interface can mismatch; a reset is
    /// needed to restore the requested resolution.
    ///
    /// # Errors
    ///
    /// [`Error::NotAvailable`] below protocol 1.2.
    pub fn resolution_mismatch(&self) -> Result<bool> {
        self.version.require(PresentFeature::ResolutionMismatch)?;
        let params = self.state().params;
        if self.ex || params.windowed {
            return Ok(false);
        }
        let Some(window) = params.device_window else {
            return Ok(false);
        };
        let windows = self.windows();
        let mode = windows
            .window_display_index(window)
            .and_then(|display| windows.current_display_mode(display));
        Ok(match mode {
            Ok(mode) => {
                mode.width != params.back_buffer_width || mode.height != params.back_buffer_height
            }
            Err(_) => false,
        })
    }

    /// Spawns a named native thread. Protocol 1.2.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAvailable`] below protocol 1.2.
    /// - [`Error::OutOfResources`] when the thread cannot be spawned.
    pub fn create_thread<F>(&self, f: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        self.version.require(PresentFeature::ThreadHelpers)?;
        thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(f)
            .map_err(|err| {
                log::error!("Failed to spawn thread: {err}");
                Error::OutOfResources
            })
    }

    /// Joins a thread from [`create_thread`](Self::create_thread).
    /// Protocol 1.2.
    ///
    /// # Errors
    ///
    /// [`Error::NotAvailable`] below protocol 1.2.
    pub fn wait_for_thread(&self, handle: JoinHandle<()>) -> Result<()> {
        self.version.require(PresentFeature::ThreadHelpers)?;
        if handle.join().is_err() {
            log::warn!("{THREAD_NAME} panicked");
        }
        Ok(())
    }

    /// Applies the second parameter block and recomputes the submit flags.
    /// Protocol 1.3.
    ///
    /// Tear-free discard is only honored together with delayed release.
    ///
    /// # Errors
    ///
    /// [`Error::NotAvailable`] below protocol 1.3.
    pub fn set_present_parameters2(&self, params2: &PresentParameters2) -> Result<()> {
        self.version.require(PresentFeature::Params2)?;
        let mut state = self.state();
        state.params2 = PresentParameters2 {
            allow_discard_delayed_release: params2.allow_discard_delayed_release,
            tear_free_discard: params2.allow_discard_delayed_release
                && params2.tear_free_discard,
        };
        state.flags = DerivedFlags::compute(&state.params, &state.params2);
        Ok(())
    }

    /// Whether the display server is done with `buffer`. Protocol 1.3.
    ///
    /// # Errors
    ///
    /// [`Error::NotAvailable`] below protocol 1.3.
    pub fn is_buffer_released(&self, buffer: &ImportedBuffer) -> Result<bool> {
        self.version.require(PresentFeature::BufferReleasePolling)?;
        Ok(self.platform.present.is_released(buffer.token))
    }

    /// Blocks until any buffer of this surface is released. Protocol 1.3.
    ///
    /// # Errors
    ///
    /// [`Error::NotAvailable`] below protocol 1.3.
    pub fn wait_buffer_release_event(&self) -> Result<()> {
        self.version.require(PresentFeature::ReleaseEvent)?;
        self.platform.present.wait_release_event(self.context);
        Ok(())
    }
}

/// Applies `params` to the window and, on success, stores them in `state`.
fn configure(
    windows: &dyn WindowSystem,
    ex: bool,
    no_window_changes: bool,
    state: &mut SurfaceState,
    params: &mut PresentParameters,
    fullscreen_mode: Option<&ModeDesc>,
) -> Result<()> {
    log::trace!(
        "set_parameters: device_window={:?}, windowed={}, {}x{}",
        params.device_window,
        params.windowed,
        params.back_buffer_width,
        params.back_buffer_height
    );

    if params.device_window.is_none() {
        params.device_window = state.params.device_window;
    }
    let Some(window) = params.device_window else {
        log::error!("No device window to configure.");
        return Err(Error::InvalidArgument);
    };
    let Some((live_width, live_height)) = windows.window_size(window) else {
        log::error!("Window {window:?} cannot be resolved.");
        return Err(Error::InvalidArgument);
    };

    let mode = match fullscreen_mode {
        Some(mode) => Some(mode.to_native()),
        None if !ex => Some(DisplayMode {
            width: params.back_buffer_width,
            height: params.back_buffer_height,
            refresh_rate: params.fullscreen_refresh_rate,
            format: to_native(params.back_buffer_format),
        }),
        None => None,
    };
    if let Some(mode) = mode {
        windows
            .set_window_display_mode(window, &mode)
            .map_err(|err| driver_error("Setting window display mode", &err))?;
    }

    windows
        .set_window_fullscreen(window, !params.windowed)
        .map_err(|err| driver_error("Switching fullscreen state", &err))?;

    if params.back_buffer_width == 0 || params.back_buffer_height == 0 {
        if !params.windowed {
            return Err(Error::InvalidArgument);
        }
        if params.back_buffer_width == 0 {
            params.back_buffer_width = live_width;
        }
        if params.back_buffer_height == 0 {
            params.back_buffer_height = live_height;
        }
    } else if params.windowed && !no_window_changes {
        windows.set_window_size(window, params.back_buffer_width, params.back_buffer_height);
    }

    state.params = *params;
    state.flags = DerivedFlags::compute(&state.params, &state.params2);

    if !params.windowed {
        apply_fullscreen_hints(windows, window);
    }
    Ok(())
}

/// Asks the compositor to unredirect `window` and enables variable refresh.
/// Failures only log.
fn apply_fullscreen_hints(windows: &dyn WindowSystem, window: WindowId) {
    let native = match windows.native_window(window) {
        Ok(native) => native,
        Err(err) => {
            log::warn!("No native window for fullscreen hints: {err}");
            return;
        }
    };
    if let Err(err) = windows.set_bypass_compositor(native, true) {
        log::warn!("Failed to set compositor bypass: {err}");
    }
    if let Err(err) = windows.set_variable_refresh(native, true) {
        log::warn!("Failed to enable variable refresh: {err}");
    }
}

impl Unknown for PresentSurface {
    const NAME: &'static str = "PresentSurface";

    fn supports(&self, iid: Iid) -> bool {
        iid == Iid::Present
    }
}

impl Drop for PresentSurface {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(window) = state.params.device_window {
            if let Err(err) = self.platform.windows.set_window_fullscreen(window, false) {
                log::warn!("Failed to leave fullscreen on teardown: {err}");
            }
        }
        if let Some(cursor) = state.cursor.take() {
            self.platform.windows.free_cursor(cursor);
        }
        self.platform.present.destroy(self.context);
        self.backend.deinit();
    }
}
