// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Release events sent by the mock server and not yet consumed.

use std::collections::VecDeque;

use nineport_core::present::ReleaseToken;

/// The server's release-event backlog.
///
/// The backlog holds at most `limit` events; sending one more evicts the
/// oldest and counts it as lost.
#[derive(Debug, Clone)]
pub(crate) struct ReleaseEvents {
    pending: VecDeque<ReleaseToken>,
    limit: usize,
    lost: u64,
}

impl ReleaseEvents {
    pub(crate) fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            pending: VecDeque::with_capacity(limit),
            limit,
            lost: 0,
        }
    }

    /// Records that the server is done with `token`.
    pub(crate) fn send(&mut self, token: ReleaseToken) {
        if self.pending.len() == self.limit && self.pending.pop_front().is_some() {
            self.lost += 1;
        }
        self.pending.push_back(token);
    }

    /// Consumes events up to and including the first one `wanted` accepts.
    ///
    /// Events ahead of the match are discarded, as a client reading its
    /// event stream would.
    pub(crate) fn next_matching(
        &mut self,
        mut wanted: impl FnMut(ReleaseToken) -> bool,
    ) -> Option<ReleaseToken> {
        while let Some(token) = self.pending.pop_front() {
            if wanted(token) {
                return Some(token);
            }
        }
        None
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn lost(&self) -> u64 {
        self.lost
    }
}
