// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Submit flags derived from presentation parameters.

use nineport_core::params::{PresentInterval, PresentParameters, PresentParameters2, SwapEffect};

/// The three values a present submit needs, always computed together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct DerivedFlags {
    /// Vertical blanks to wait; zero for immediate.
    pub interval: u32,
    /// Flip without waiting for vertical blank.
    pub async_present: bool,
    /// Copy instead of flip so the server never holds the buffer.
    pub force_copy: bool,
}

impl DerivedFlags {
    /// Computes the flags for `params` under the negotiated second block.
    ///
    /// An immediate present is asynchronous unless the swap effect is discard
    /// and tear-free discard was negotiated. Copy is forced for the copy swap
    /// effect, and for immediate presents unless the swap effect is discard
    /// and delayed release was negotiated.
    #[must_use]
    pub fn compute(params: &PresentParameters, params2: &PresentParameters2) -> Self {
        let discard = params.swap_effect == SwapEffect::Discard;
        let (interval, async_present) = match params.presentation_interval {
            PresentInterval::Default | PresentInterval::One => (1, false),
            PresentInterval::Two => (2, false),
            PresentInterval::Three => (3, false),
            PresentInterval::Four => (4, false),
            PresentInterval::Immediate => (0, !(discard && params2.tear_free_discard)),
        };
        let force_copy = params.swap_effect == SwapEffect::Copy
            || (interval == 0 && !(discard && params2.allow_discard_delayed_release));
        Self {
            interval,
            async_present,
            force_copy,
        }
    }
}
