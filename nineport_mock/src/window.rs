// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory window system.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nineport_core::error::PlatformError;
use nineport_core::format::PixelFormat;
use nineport_core::geometry::Point;
use nineport_core::mode::DisplayMode;
use nineport_core::window::{
    CursorHandle, CursorImage, GammaRamp, NativeWindow, WindowId, WindowSystem,
};

/// One attached display.
#[derive(Clone, Debug, Default)]
pub struct MockDisplay {
    /// Supported modes in report order.
    pub modes: Vec<DisplayMode>,
    /// Mode indices whose query fails.
    pub failing_modes: Vec<u32>,
    /// The running mode.
    pub current: DisplayMode,
}

impl MockDisplay {
    /// A display supporting `modes`, running the first one.
    #[must_use]
    pub fn with_modes(modes: Vec<DisplayMode>) -> Self {
        let current = modes.first().copied().unwrap_or_default();
        Self {
            modes,
            failing_modes: Vec::new(),
            current,
        }
    }
}

/// One application window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockWindow {
    /// Client width.
    pub width: u32,
    /// Client height.
    pub height: u32,
    /// Display index.
    pub display: u32,
    /// Fullscreen state.
    pub fullscreen: bool,
    /// Mode used when fullscreen.
    pub display_mode: DisplayMode,
    /// Minimized state.
    pub minimized: bool,
    /// Drawable, or `None` if the window has no native handle.
    pub native: Option<NativeWindow>,
    /// Compositor bypass hint.
    pub bypass_compositor: bool,
    /// Variable refresh hint.
    pub variable_refresh: bool,
}

/// Observable state of a [`MockWindowSystem`].
#[derive(Debug)]
pub struct WindowState {
    /// Reported by `video_initialized`.
    pub video_initialized: bool,
    /// Fail `num_video_displays`.
    pub fail_display_count: bool,
    /// Attached displays.
    pub displays: Vec<MockDisplay>,
    /// Known windows.
    pub windows: HashMap<WindowId, MockWindow>,
    /// Fail `set_window_display_mode`.
    pub fail_set_display_mode: bool,
    /// Fail `set_window_fullscreen`.
    pub fail_fullscreen: bool,
    /// Fail both fullscreen hints.
    pub fail_hints: bool,
    /// Fail `create_color_cursor`.
    pub fail_create_cursor: bool,
    /// Fail `set_window_gamma_ramp`.
    pub fail_gamma: bool,
    /// Offset applied to every warp, to simulate a pointer that lands elsewhere.
    pub warp_error: Point,
    /// Pointer position.
    pub pointer: Point,
    /// Number of warps performed.
    pub warps: u32,
    /// Pointer visibility.
    pub cursor_visible: bool,
    /// Current cursor.
    pub current_cursor: Option<CursorHandle>,
    /// Cursors created and not freed.
    pub live_cursors: Vec<CursorHandle>,
    /// Every `set_window_size` call.
    pub resizes: Vec<(WindowId, u32, u32)>,
    /// Every applied gamma ramp.
    pub gamma: Vec<(WindowId, GammaRamp)>,
    /// Fixed `(counter, frequency)`; `None` uses the host clock.
    pub counter: Option<(u64, u64)>,
    next_cursor: u64,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            video_initialized: true,
            fail_display_count: false,
            displays: Vec::new(),
            windows: HashMap::new(),
            fail_set_display_mode: false,
            fail_fullscreen: false,
            fail_hints: false,
            fail_create_cursor: false,
            fail_gamma: false,
            warp_error: Point::default(),
            pointer: Point::default(),
            warps: 0,
            cursor_visible: true,
            current_cursor: None,
            live_cursors: Vec::new(),
            resizes: Vec::new(),
            gamma: Vec::new(),
            counter: None,
            next_cursor: 0,
        }
    }
}

impl WindowState {
    fn window(&self, window: WindowId) -> Result<&MockWindow, PlatformError> {
        self.windows
            .get(&window)
            .ok_or_else(|| PlatformError::new(format!("Invalid window {}", window.0)))
    }

    fn window_mut(&mut self, window: WindowId) -> Result<&mut MockWindow, PlatformError> {
        self.windows
            .get_mut(&window)
            .ok_or_else(|| PlatformError::new(format!("Invalid window {}", window.0)))
    }

    fn display(&self, display: u32) -> Result<&MockDisplay, PlatformError> {
        usize::try_from(display)
            .ok()
            .and_then(|index| self.displays.get(index))
            .ok_or_else(|| PlatformError::new(format!("Invalid display {display}")))
    }
}

/// A window system held entirely in memory.
#[derive(Debug, Default)]
pub struct MockWindowSystem {
    state: Mutex<WindowState>,
}

/// A 60 Hz XRGB mode.
#[must_use]
pub fn mode(width: u32, height: u32) -> DisplayMode {
    DisplayMode {
        width,
        height,
        refresh_rate: 60,
        format: PixelFormat::Rgbx8888,
    }
}

impl MockWindowSystem {
    /// An empty window system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One display with three modes, running 1920×1080.
    #[must_use]
    pub fn single_display() -> Self {
        let system = Self::new();
        system.add_display(MockDisplay::with_modes(vec![
            mode(1920, 1080),
            mode(1280, 720),
            mode(800, 600),
        ]));
        system
    }

    /// Locks and returns the state.
    pub fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attaches a display and returns its index.
    pub fn add_display(&self, display: MockDisplay) -> u32 {
        let mut state = self.state();
        state.displays.push(display);
        u32::try_from(state.displays.len() - 1).unwrap_or(u32::MAX)
    }

    /// Creates a windowed window on display 0 with a native handle.
    pub fn add_window(&self, id: WindowId, width: u32, height: u32) {
        let mut state = self.state();
        let display_mode = state
            .displays
            .first()
            .map(|display| display.current)
            .unwrap_or_default();
        state.windows.insert(
            id,
            MockWindow {
                width,
                height,
                display: 0,
                fullscreen: false,
                display_mode,
                minimized: false,
                native: Some(NativeWindow(id.0 + 0x1000)),
                bypass_compositor: false,
                variable_refresh: false,
            },
        );
    }

    /// Returns a copy of a window's state.
    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<MockWindow> {
        self.state().windows.get(&id).cloned()
    }
}

impl WindowSystem for MockWindowSystem {
    fn video_initialized(&self) -> bool {
        self.state().video_initialized
    }

    fn num_video_displays(&self) -> Result<u32, PlatformError> {
        let state = self.state();
        if state.fail_display_count {
            return Err(PlatformError::new("Video subsystem has not been initialized"));
        }
        Ok(u32::try_from(state.displays.len()).unwrap_or(u32::MAX))
    }

    fn num_display_modes(&self, display: u32) -> Result<u32, PlatformError> {
        let state = self.state();
        let display = state.display(display)?;
        Ok(u32::try_from(display.modes.len()).unwrap_or(u32::MAX))
    }

    fn display_mode(&self, display: u32, index: u32) -> Result<DisplayMode, PlatformError> {
        let state = self.state();
        let display = state.display(display)?;
        if display.failing_modes.contains(&index) {
            return Err(PlatformError::new(format!("Mode {index} unavailable")));
        }
        usize::try_from(index)
            .ok()
            .and_then(|index| display.modes.get(index))
            .copied()
            .ok_or_else(|| PlatformError::new(format!("Invalid mode index {index}")))
    }

    fn current_display_mode(&self, display: u32) -> Result<DisplayMode, PlatformError> {
        Ok(self.state().display(display)?.current)
    }

    fn window_display_index(&self, window: WindowId) -> Result<u32, PlatformError> {
        Ok(self.state().window(window)?.display)
    }

    fn window_display_mode(&self, window: WindowId) -> Result<DisplayMode, PlatformError> {
        Ok(self.state().window(window)?.display_mode)
    }

    fn set_window_display_mode(
        &self,
        window: WindowId,
        mode: &DisplayMode,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.fail_set_display_mode {
            return Err(PlatformError::new("Mode switch refused"));
        }
        state.window_mut(window)?.display_mode = *mode;
        Ok(())
    }

    fn set_window_fullscreen(
        &self,
        window: WindowId,
        fullscreen: bool,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.fail_fullscreen {
            return Err(PlatformError::new("Fullscreen switch refused"));
        }
        let mock = state.window_mut(window)?;
        mock.fullscreen = fullscreen;
        if fullscreen {
            let mode = mock.display_mode;
            let display = mock.display;
            if let Some(display) = usize::try_from(display)
                .ok()
                .and_then(|index| state.displays.get_mut(index))
            {
                display.current = mode;
            }
        }
        Ok(())
    }

    fn window_size(&self, window: WindowId) -> Option<(u32, u32)> {
        self.state()
            .windows
            .get(&window)
            .map(|mock| (mock.width, mock.height))
    }

    fn set_window_size(&self, window: WindowId, width: u32, height: u32) {
        let mut state = self.state();
        state.resizes.push((window, width, height));
        if let Some(mock) = state.windows.get_mut(&window) {
            mock.width = width;
            mock.height = height;
        }
    }

    fn window_minimized(&self, window: WindowId) -> bool {
        self.state()
            .windows
            .get(&window)
            .is_some_and(|mock| mock.minimized)
    }

    fn native_window(&self, window: WindowId) -> Result<NativeWindow, PlatformError> {
        self.state()
            .window(window)?
            .native
            .ok_or_else(|| PlatformError::new("Window has no native handle"))
    }

    fn set_bypass_compositor(
        &self,
        native: NativeWindow,
        bypass: bool,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.fail_hints {
            return Err(PlatformError::new("Property change refused"));
        }
        for mock in state.windows.values_mut() {
            if mock.native == Some(native) {
                mock.bypass_compositor = bypass;
            }
        }
        Ok(())
    }

    fn set_variable_refresh(
        &self,
        native: NativeWindow,
        enable: bool,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.fail_hints {
            return Err(PlatformError::new("Property change refused"));
        }
        for mock in state.windows.values_mut() {
            if mock.native == Some(native) {
                mock.variable_refresh = enable;
            }
        }
        Ok(())
    }

    fn global_mouse_state(&self) -> Result<Point, PlatformError> {
        Ok(self.state().pointer)
    }

    fn warp_mouse_global(&self, position: Point) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.warps += 1;
        state.pointer = Point::new(
            position.x + state.warp_error.x,
            position.y + state.warp_error.y,
        );
        Ok(())
    }

    fn show_cursor(&self, visible: bool) {
        self.state().cursor_visible = visible;
    }

    fn create_color_cursor(
        &self,
        _image: &CursorImage,
        _hotspot: Point,
    ) -> Result<CursorHandle, PlatformError> {
        let mut state = self.state();
        if state.fail_create_cursor {
            return Err(PlatformError::new("Cursor creation refused"));
        }
        state.next_cursor += 1;
        let cursor = CursorHandle(state.next_cursor);
        state.live_cursors.push(cursor);
        Ok(cursor)
    }

    fn set_cursor(&self, cursor: Option<CursorHandle>) {
        self.state().current_cursor = cursor;
    }

    fn free_cursor(&self, cursor: CursorHandle) {
        let mut state = self.state();
        state.live_cursors.retain(|live| *live != cursor);
        if state.current_cursor == Some(cursor) {
            state.current_cursor = None;
        }
    }

    fn set_window_gamma_ramp(
        &self,
        window: WindowId,
        ramp: &GammaRamp,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.fail_gamma {
            return Err(PlatformError::new("Gamma ramp refused"));
        }
        state.window(window)?;
        state.gamma.push((window, *ramp));
        Ok(())
    }

    fn performance_counter(&self) -> u64 {
        match self.state().counter {
            Some((counter, _)) => counter,
            None => nineport_core::time::now().ticks(),
        }
    }

    fn performance_frequency(&self) -> u64 {
        match self.state().counter {
            Some((_, frequency)) => frequency,
            None => nineport_core::time::FREQUENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MockDisplay, MockWindowSystem, mode};
    use nineport_core::window::{WindowId, WindowSystem};

    #[test]
    fn failing_mode_is_reported() {
        let system = MockWindowSystem::new();
        let mut display = MockDisplay::with_modes(vec![mode(640, 480), mode(800, 600)]);
        display.failing_modes.push(1);
        system.add_display(display);

        assert_eq!(system.num_display_modes(0).unwrap(), 2);
        assert!(system.display_mode(0, 0).is_ok());
        assert!(system.display_mode(0, 1).is_err());
        assert!(system.display_mode(1, 0).is_err());
    }

    #[test]
    fn fullscreen_switch_applies_window_mode() {
        let system = MockWindowSystem::single_display();
        let id = WindowId(1);
        system.add_window(id, 640, 480);
        system.set_window_display_mode(id, &mode(800, 600)).unwrap();
        system.set_window_fullscreen(id, true).unwrap();
        assert_eq!(system.current_display_mode(0).unwrap(), mode(800, 600));
    }

    #[test]
    fn unknown_window_has_no_size() {
        let system = MockWindowSystem::new();
        assert_eq!(system.window_size(WindowId(5)), None);
        assert!(system.native_window(WindowId(5)).is_err());
    }
}
