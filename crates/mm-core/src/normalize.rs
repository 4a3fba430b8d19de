//! Linear peak normalization
//!
//! Scales a signal so its largest absolute sample hits a target magnitude.
//! Used by demo and playback code around the core processors.

use crate::{MurmurError, MurmurResult, Sample, Signal};

/// Default normalization target (full scale)
pub const DEFAULT_PEAK_TARGET: Sample = 1.0;

/// Scale `signal` linearly so its peak magnitude equals `target_peak`.
/// All-silent input has no defined gain and is returned unchanged.
pub fn normalize_peak(signal: &Signal, target_peak: Sample) -> MurmurResult<Signal> {
    signal.validate()?;
    if target_peak <= 0.0 || !target_peak.is_finite() {
        return Err(MurmurError::ParameterOutOfRange(format!(
            "normalization target must be a positive finite value, got {target_peak}"
        )));
    }

    let peak = signal.peak();
    if peak == 0.0 {
        return Ok(signal.clone());
    }

    let gain = target_peak / peak;
    let channels = (0..signal.channels())
        .map(|ch| signal.channel(ch).iter().map(|s| s * gain).collect())
        .collect();
    Ok(Signal::from_channels(channels))
}
