//! Layer 0: Time primitives
//!
//! Version for server ordering. Timestamp for local transform estimation
//! (not ordering).

use serde::{Deserialize, Serialize};

/// Server-assigned logical timestamp - the ordering primitive.
///
/// Totally ordered, opaque to callers. Never decreases for a given key
/// across durable writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// "No server version yet": local-only snapshots (e.g. an
    /// unacknowledged local deletion) carry this.
    pub const NONE: Version = Version(0);

    pub fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Wall clock instant in milliseconds since the Unix epoch.
///
/// Seeds local estimates of time-based transforms while a write is in
/// flight - NOT for causal ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    pub fn millis(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_order_totally() {
        assert!(Version::new(5) < Version::new(6));
        assert!(Version::NONE < Version::new(1));
        assert!(Version::NONE.is_none());
        assert!(!Version::new(1).is_none());
    }
}
