//! Run fingerprinting for reproducibility checks.
//!
//! Two runs with identical configuration and identical price data must
//! produce byte-identical snapshot sequences; the fingerprint makes that
//! property cheap to assert and cheap to store alongside artifacts.

use crate::domain::DailySnapshot;
use serde::Serialize;

/// Content-addressed fingerprint of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct RunFingerprint(pub String);

impl std::fmt::Display for RunFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// BLAKE3 over the serialized config followed by the snapshot sequence.
pub fn fingerprint_run<C: Serialize>(
    config: &C,
    snapshots: &[DailySnapshot],
) -> Result<RunFingerprint, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(config)?);
    hasher.update(&serde_json::to_vec(snapshots)?);
    Ok(RunFingerprint(hasher.finalize().to_hex().to_string()))
}
