// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Performance event markers.
//!
//! Markers only track nesting depth; nothing is recorded.

use std::sync::atomic::{AtomicI32, Ordering};

/// Nesting depth of begin/end event pairs.
#[derive(Debug, Default)]
pub struct PerfEvents {
    level: AtomicI32,
}

static PROCESS_EVENTS: PerfEvents = PerfEvents::new();

impl PerfEvents {
    /// Depth zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: AtomicI32::new(0),
        }
    }

    /// The counter shared by the whole process.
    #[must_use]
    pub fn process() -> &'static Self {
        &PROCESS_EVENTS
    }

    /// Opens an event and returns the depth before it.
    pub fn begin_event(&self, color: u32, name: &str) -> i32 {
        log::trace!("color {color:#010x}, name {name}.");
        self.level.fetch_add(1, Ordering::Relaxed)
    }

    /// Closes an event and returns the depth after it.
    pub fn end_event(&self) -> i32 {
        self.level.fetch_sub(1, Ordering::Relaxed) - 1
    }

    /// Current depth.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level.load(Ordering::Relaxed)
    }

    /// Profiler status; no profiler is ever attached.
    #[must_use]
    pub fn status(&self) -> u32 {
        0
    }

    /// Whether the profiler wants the frame repeated; never.
    #[must_use]
    pub fn query_repeat_frame(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::PerfEvents;

    #[test]
    fn begin_and_end_track_depth() {
        let events = PerfEvents::new();
        assert_eq!(events.begin_event(0xff00_00ff, "frame"), 0);
        assert_eq!(events.begin_event(0, "pass"), 1);
        assert_eq!(events.level(), 2);
        assert_eq!(events.end_event(), 1);
        assert_eq!(events.end_event(), 0);
        assert_eq!(events.status(), 0);
        assert!(!events.query_repeat_frame());
    }

    #[test]
    fn unbalanced_end_goes_negative() {
        let events = PerfEvents::new();
        assert_eq!(events.end_event(), -1);
    }
}
