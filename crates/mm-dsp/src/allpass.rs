//! First-order tunable all-pass filter and the filters derived from it
//!
//! The all-pass leaves the magnitude response flat and only shifts phase,
//! crossing -90 degrees at the centre frequency. Low-pass, high-pass, and
//! shelf responses are built by mixing the all-pass output back against the
//! dry signal, so the numerically delicate part (the pole derivation) lives
//! in one place.

use std::f64::consts::PI;

use mm_core::{MurmurError, MurmurResult, Sample, Signal, db_to_amplitude};

/// Operating mode for the pole derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllpassMode {
    /// Plain phase shifter; gain is ignored
    #[default]
    General,
    /// Pole placement for a low-shelf cut; requires negative gain
    LowShelfCut,
    /// Pole placement for a high-shelf cut; requires negative gain
    HighShelfCut,
}

fn check_frequency(fc: f64, fs: f64) -> MurmurResult<()> {
    if fs <= 0.0 || !fs.is_finite() {
        return Err(MurmurError::ParameterOutOfRange(format!(
            "sampling frequency must be positive, got {fs}"
        )));
    }
    let nyquist = fs / 2.0;
    if !(fc > 0.0 && fc < nyquist) {
        return Err(MurmurError::ParameterOutOfRange(format!(
            "centre frequency must lie in (0, {nyquist}), got {fc}"
        )));
    }
    Ok(())
}

/// Linear gain factor for the cut modes; non-negative gain has no stable pole
/// placement there.
fn cut_gain(mode: AllpassMode, gain_db: f64) -> MurmurResult<f64> {
    if gain_db >= 0.0 {
        return Err(MurmurError::InvalidMode(format!(
            "{mode:?} requires a negative gain, got {gain_db} dB"
        )));
    }
    Ok(db_to_amplitude(gain_db))
}

/// Derive the single pole coefficient. Input constraints keep |p| < 1.
fn pole(fc: f64, fs: f64, mode: AllpassMode, gain_db: f64) -> MurmurResult<Sample> {
    let t = (PI * fc / fs).tan();
    match mode {
        AllpassMode::General => Ok(2.0 / (t + 1.0) - 1.0),
        AllpassMode::LowShelfCut => {
            let c = cut_gain(mode, gain_db)?;
            Ok(2.0 * c / (t + c) - 1.0)
        }
        AllpassMode::HighShelfCut => {
            let c = cut_gain(mode, gain_db)?;
            Ok(2.0 / (c * t + 1.0) - 1.0)
        }
    }
}

/// First-order all-pass over a whole signal, zero initial state per channel:
/// `y[0] = p·x[0]`, then `y[n] = x[n-1] - p·x[n] + p·y[n-1]`.
pub fn allpass(
    input: &Signal,
    fc: f64,
    fs: f64,
    mode: AllpassMode,
    gain_db: f64,
) -> MurmurResult<Signal> {
    input.validate()?;
    check_frequency(fc, fs)?;
    let p = pole(fc, fs, mode, gain_db)?;
    log::debug!("allpass pole {p:.6} for fc {fc} Hz at fs {fs} Hz ({mode:?})");

    let mut channels = Vec::with_capacity(input.channels());
    for ch in 0..input.channels() {
        let x = input.channel(ch);
        let mut y = vec![0.0; x.len()];
        y[0] = p * x[0];
        for n in 1..x.len() {
            y[n] = x[n - 1] - p * x[n] + p * y[n - 1];
        }
        channels.push(y);
    }
    Ok(Signal::from_channels(channels))
}

/// Sample-wise combination of a dry signal with its all-pass image
fn mix(dry: &Signal, ap: &Signal, f: impl Fn(Sample, Sample) -> Sample) -> Signal {
    let channels = (0..dry.channels())
        .map(|ch| {
            dry.channel(ch)
                .iter()
                .zip(ap.channel(ch))
                .map(|(x, a)| f(*x, *a))
                .collect()
        })
        .collect();
    Signal::from_channels(channels)
}

/// First-order low-pass: `(x + allpass(x)) / 2`
pub fn low_pass1(input: &Signal, fc: f64, fs: f64) -> MurmurResult<Signal> {
    let ap = allpass(input, fc, fs, AllpassMode::General, 0.0)?;
    Ok(mix(input, &ap, |x, a| (x + a) / 2.0))
}

/// First-order high-pass: `(x - allpass(x)) / 2`
pub fn high_pass1(input: &Signal, fc: f64, fs: f64) -> MurmurResult<Signal> {
    let ap = allpass(input, fc, fs, AllpassMode::General, 0.0)?;
    Ok(mix(input, &ap, |x, a| (x - a) / 2.0))
}

/// First-order low shelf. A boost keeps the general pole; a cut flips to the
/// shelf-cut pole placement so the corner stays at `fc`.
pub fn low_shelf1(input: &Signal, fc: f64, fs: f64, gain_db: f64) -> MurmurResult<Signal> {
    let mode = if gain_db < 0.0 {
        AllpassMode::LowShelfCut
    } else {
        AllpassMode::General
    };
    let ap = allpass(input, fc, fs, mode, gain_db)?;
    let scale = db_to_amplitude(gain_db) - 1.0;
    Ok(mix(input, &ap, |x, a| scale * (x + a) / 2.0 + x))
}

/// First-order high shelf, symmetric to [`low_shelf1`]
pub fn high_shelf1(input: &Signal, fc: f64, fs: f64, gain_db: f64) -> MurmurResult<Signal> {
    let mode = if gain_db < 0.0 {
        AllpassMode::HighShelfCut
    } else {
        AllpassMode::General
    };
    let ap = allpass(input, fc, fs, mode, gain_db)?;
    let scale = db_to_amplitude(gain_db) - 1.0;
    Ok(mix(input, &ap, |x, a| scale * (x - a) / 2.0 + x))
}
