// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Processing capability gate.
//!
//! A run checks its capability exactly once, before any dataset is read for
//! mutation. Availability is injected rather than held in global state.

use crate::error::{Error, Result};

/// Answers whether a named processing capability can be used.
pub trait CapabilityProvider: Send + Sync {
    /// Human-readable capability name used in diagnostics.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;
}

/// Fixed availability, for embedding and tests.
#[derive(Debug, Clone)]
pub struct StaticCapability {
    name: String,
    available: bool,
}

impl StaticCapability {
    pub fn available(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
        }
    }

    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: false,
        }
    }
}

impl CapabilityProvider for StaticCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Capability switched off through an environment variable.
///
/// Available unless the variable is set to `0`, `false` or `off`.
#[derive(Debug, Clone)]
pub struct EnvCapability {
    name: String,
    var: String,
}

impl EnvCapability {
    pub fn new(name: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var: var.into(),
        }
    }
}

impl CapabilityProvider for EnvCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        match std::env::var(&self.var) {
            Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off"),
            Err(_) => true,
        }
    }
}

/// Fail with [`Error::CapabilityUnavailable`] unless the capability is usable.
pub fn ensure_available(capability: &dyn CapabilityProvider) -> Result<()> {
    if capability.is_available() {
        tracing::debug!(capability = capability.name(), "Capability available");
        Ok(())
    } else {
        tracing::error!(capability = capability.name(), "Capability unavailable");
        Err(Error::CapabilityUnavailable {
            capability: capability.name().to_string(),
        })
    }
}
