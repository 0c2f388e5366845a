//! Run fingerprinting — a stable identity for a configuration + seed.
//!
//! Two runs with the same fingerprint and the same bars must produce
//! byte-identical trade logs and equity curves. The fingerprint is the BLAKE3
//! hash of the configuration's canonical JSON (field order is declaration
//! order, so the serialization is stable across builds).

use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex BLAKE3 digest identifying a run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint(pub String);

impl RunFingerprint {
    pub fn of(config: &EngineConfig) -> Self {
        // Serialization of a plain numeric/enum struct cannot fail.
        let canonical = serde_json::to_string(config).expect("EngineConfig serializes");
        Self(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

impl fmt::Display for RunFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
