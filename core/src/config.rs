//! Handshake configuration.
//!
//! Small, explicit config struct in the spirit of the teacher's
//! `ForwarderConfig` — a place to override defaults for test harnesses
//! without recompiling the crate. Retry counts are deliberately absent:
//! retransmission is a non-goal of this codec.

use crate::message::{VersionString, MAX_VERSION_LEN};

/// The version string this crate reports of itself during handshake,
/// unless overridden by [`HandshakeConfig::local_version`].
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Controls how `Session::startup` compares versions and which local
/// version string it advertises.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    local_version: VersionString,
    /// When `true` (the default), a version mismatch with the remote
    /// fails `startup` with `VersionMismatch`. `startup_ignore_mismatch`
    /// forces this to `false` for that one call regardless of this field.
    pub fail_on_version_mismatch: bool,
}

impl HandshakeConfig {
    /// Builds a config advertising `LIBRARY_VERSION`, failing on mismatch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_version: crate::message::copy_truncated(LIBRARY_VERSION, MAX_VERSION_LEN),
            fail_on_version_mismatch: true,
        }
    }

    /// Overrides the version string this session advertises, truncated
    /// to capacity like any other version string on the wire.
    #[must_use]
    pub fn with_local_version(mut self, version: &str) -> Self {
        self.local_version = crate::message::copy_truncated(version, MAX_VERSION_LEN);
        self
    }

    #[must_use]
    pub fn with_fail_on_version_mismatch(mut self, fail: bool) -> Self {
        self.fail_on_version_mismatch = fail;
        self
    }

    #[must_use]
    pub fn local_version(&self) -> &str {
        &self.local_version
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_advertises_crate_version() {
        let cfg = HandshakeConfig::new();
        assert_eq!(cfg.local_version(), LIBRARY_VERSION);
        assert!(cfg.fail_on_version_mismatch);
    }

    #[test]
    fn override_truncates_like_any_version_string() {
        let long = "x".repeat(64);
        let cfg = HandshakeConfig::new().with_local_version(&long);
        assert_eq!(cfg.local_version().len(), MAX_VERSION_LEN);
    }
}
