/// Conclave version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tag attached to memory entries written by tasks of a cancelled session.
pub const CANCELLED_SESSION_TAG: &str = "cancelled-session";

/// Number of bits in a similarity signature.
pub const SIGNATURE_BITS: u32 = 64;

/// Number of LSH bands a signature is split into for candidate lookup.
pub const SIGNATURE_BANDS: usize = 4;

/// Width of a single LSH band in bits.
pub const SIGNATURE_BAND_WIDTH: u32 = SIGNATURE_BITS / SIGNATURE_BANDS as u32;

/// Hard cap on entries returned by a single retrieval call.
pub const MAX_RETRIEVAL_LIMIT: usize = 500;

/// Smallest distance a calibrated score keeps from 0 and 1.
pub const CALIBRATION_EPSILON: f64 = 1e-9;
