// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Result codes returned across the public boundary.
//!
//! Every fallible operation returns one of the five [`Error`] kinds; raw
//! platform error codes never leak out. Platform contract calls report their
//! failures as [`PlatformError`], which the caller logs and converts.

use core::fmt;

/// The closed set of failure codes an application can observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// Bad adapter index, missing required value, unresolved window, or
    /// inconsistent parameters. Always detected before delegating.
    InvalidArgument,
    /// An allocation failed while growing a table or building an object.
    OutOfResources,
    /// The backend, present extension, or display server reported a failure.
    DriverInternal,
    /// No usable backend, adapter, extension, or protocol tier.
    NotAvailable,
    /// The object does not implement the requested interface.
    NoInterface,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidArgument => "invalid call",
            Self::OutOfResources => "out of resources",
            Self::DriverInternal => "driver internal error",
            Self::NotAvailable => "not available",
            Self::NoInterface => "no such interface",
        })
    }
}

impl core::error::Error for Error {}

/// Convenience alias used throughout the workspace.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A failure reported by a platform contract call.
///
/// Carries the platform's own error string (the equivalent of a "last error"
/// query) for logging. It is never returned to the application directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformError {
    message: String,
}

impl PlatformError {
    /// Creates an error from a platform message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the platform's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for PlatformError {}
