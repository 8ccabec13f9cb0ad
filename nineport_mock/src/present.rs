// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording present extension.
//!
//! Pixmaps are "in flight" from `submit` until the test releases them with
//! [`MockPresentExtension::release`] or a blocking wait completes, which
//! stands in for the display server's idle notification.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nineport_core::backend::PixmapHandle;
use nineport_core::geometry::{Rect, Region};
use nineport_core::present::{PresentContext, PresentExtension, ReleaseToken, SubmitOptions};
use nineport_core::window::NativeWindow;

use crate::queue::ReleaseEvents;

const RELEASE_EVENT_CAPACITY: usize = 16;

/// One recorded submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Target drawable.
    pub window: NativeWindow,
    /// Tracked pixmap.
    pub token: ReleaseToken,
    /// Vertical blanks to wait.
    pub interval: u32,
    /// Asynchronous flip requested.
    pub async_present: bool,
    /// Copy requested.
    pub force_copy: bool,
    /// Source rectangle.
    pub source: Option<Rect>,
    /// Destination rectangle.
    pub destination: Option<Rect>,
    /// Number of dirty rectangles passed.
    pub dirty_rects: usize,
    /// Bounding box of the dirty rectangles, if any were passed.
    pub dirty_bounds: Option<Rect>,
}

/// A tracked pixmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tracked {
    /// Owning context.
    pub context: PresentContext,
    /// The pixmap.
    pub pixmap: PixmapHandle,
    /// `true` unless the pixmap is queued on the server.
    pub released: bool,
}

/// Observable state of a [`MockPresentExtension`].
#[derive(Debug)]
pub struct PresentState {
    /// Highest `major.minor` the extension reports.
    pub version: (u32, u32),
    /// Fail every `init`.
    pub fail_init: bool,
    /// Fail every `track_pixmap`.
    pub fail_track: bool,
    /// Fail every `prepare`.
    pub fail_prepare: bool,
    /// Fail every `submit`.
    pub fail_submit: bool,
    /// Fail every blocking wait.
    pub fail_wait: bool,
    /// Contexts created and not destroyed.
    pub live_contexts: Vec<PresentContext>,
    /// Every `destroy` call, in order.
    pub destroyed_contexts: Vec<PresentContext>,
    /// Tracked pixmaps by token.
    pub tracked: HashMap<ReleaseToken, Tracked>,
    /// Every `try_free` call, in order.
    pub freed: Vec<ReleaseToken>,
    /// Every `prepare` call, in order.
    pub prepared: Vec<(NativeWindow, ReleaseToken)>,
    /// Every successful submit, in order.
    pub submissions: Vec<Submission>,
    /// Completed `wait_release_event` calls that consumed an event.
    pub events_consumed: u32,
    release_events: ReleaseEvents,
    next_id: u64,
}

impl Default for PresentState {
    fn default() -> Self {
        Self {
            version: (1, 4),
            fail_init: false,
            fail_track: false,
            fail_prepare: false,
            fail_submit: false,
            fail_wait: false,
            live_contexts: Vec::new(),
            destroyed_contexts: Vec::new(),
            tracked: HashMap::new(),
            freed: Vec::new(),
            prepared: Vec::new(),
            submissions: Vec::new(),
            events_consumed: 0,
            release_events: ReleaseEvents::new(RELEASE_EVENT_CAPACITY),
            next_id: 0,
        }
    }
}

impl PresentState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn mark_released(&mut self, token: ReleaseToken) {
        if let Some(tracked) = self.tracked.get_mut(&token) {
            if !tracked.released {
                tracked.released = true;
                self.release_events.send(token);
            }
        }
    }

    /// Release events dropped because the queue overflowed.
    #[must_use]
    pub fn dropped_release_events(&self) -> u64 {
        self.release_events.lost()
    }

    /// Release events not yet consumed.
    #[must_use]
    pub fn pending_release_events(&self) -> usize {
        self.release_events.pending()
    }
}

/// A present extension that records every call.
#[derive(Debug, Default)]
pub struct MockPresentExtension {
    state: Mutex<PresentState>,
}

impl MockPresentExtension {
    /// Creates an extension reporting version 1.4.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks and returns the recorded state.
    pub fn state(&self) -> MutexGuard<'_, PresentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulates the display server releasing the pixmap behind `token`.
    pub fn release(&self, token: ReleaseToken) {
        self.state().mark_released(token);
    }
}

impl PresentExtension for MockPresentExtension {
    fn check_extension(&self, major: u32, minor: u32) -> bool {
        (major, minor) <= self.state().version
    }

    fn init(&self) -> Option<PresentContext> {
        let mut state = self.state();
        if state.fail_init {
            return None;
        }
        let context = PresentContext(state.next_id());
        state.live_contexts.push(context);
        Some(context)
    }

    fn destroy(&self, context: PresentContext) {
        let mut state = self.state();
        state.live_contexts.retain(|live| *live != context);
        state.tracked.retain(|_, tracked| tracked.context != context);
        state.destroyed_contexts.push(context);
    }

    fn track_pixmap(
        &self,
        context: PresentContext,
        pixmap: PixmapHandle,
        _width: u32,
        _height: u32,
        _depth: u32,
    ) -> Option<ReleaseToken> {
        let mut state = self.state();
        if state.fail_track || !state.live_contexts.contains(&context) {
            return None;
        }
        let token = ReleaseToken(state.next_id());
        state.tracked.insert(
            token,
            Tracked {
                context,
                pixmap,
                released: true,
            },
        );
        Some(token)
    }

    fn try_free(&self, token: ReleaseToken) {
        let mut state = self.state();
        state.tracked.remove(&token);
        state.freed.push(token);
    }

    fn prepare(&self, window: NativeWindow, token: ReleaseToken) -> bool {
        let mut state = self.state();
        if state.fail_prepare || !state.tracked.contains_key(&token) {
            return false;
        }
        state.prepared.push((window, token));
        true
    }

    fn submit(
        &self,
        window: NativeWindow,
        token: ReleaseToken,
        options: &SubmitOptions<'_>,
    ) -> bool {
        let mut state = self.state();
        if state.fail_submit {
            return false;
        }
        let Some(tracked) = state.tracked.get_mut(&token) else {
            return false;
        };
        tracked.released = false;
        state.submissions.push(Submission {
            window,
            token,
            interval: options.interval,
            async_present: options.async_present,
            force_copy: options.force_copy,
            source: options.source,
            destination: options.destination,
            dirty_rects: options.dirty.map_or(0, |region| region.rects().len()),
            dirty_bounds: options
                .dirty
                .filter(|region| !region.is_empty())
                .map(Region::bounds),
        });
        true
    }

    fn wait_released(&self, token: ReleaseToken) -> bool {
        let mut state = self.state();
        if state.fail_wait || !state.tracked.contains_key(&token) {
            return false;
        }
        state.mark_released(token);
        true
    }

    fn is_released(&self, token: ReleaseToken) -> bool {
        self.state()
            .tracked
            .get(&token)
            .is_some_and(|tracked| tracked.released)
    }

    fn wait_release_event(&self, context: PresentContext) {
        let mut state = self.state();
        let PresentState {
            release_events,
            tracked,
            ..
        } = &mut *state;
        let consumed = release_events.next_matching(|token| {
            tracked
                .get(&token)
                .is_some_and(|entry| entry.context == context)
        });
        if consumed.is_some() {
            state.events_consumed += 1;
        } else {
            log::debug!("No pending release event for context {}.", context.0);
        }
    }
}
