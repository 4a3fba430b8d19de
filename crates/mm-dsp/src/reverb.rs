//! Four-line feedback delay network reverb
//!
//! Stautner-Puckette topology: four parallel delay lines cross-coupled
//! through a fixed scattering matrix, a one-pole damping filter per line so
//! high frequencies decay faster than lows, and a one-zero tonal-correction
//! filter on the summed output that compensates the spectral tilt the damping
//! introduces. Input is downmixed to mono, band-limited, run through the
//! network sample by sample, band-limited again, and remixed against the dry
//! signal.

use mm_core::{MurmurError, MurmurResult, Sample, Signal};
use serde::{Deserialize, Serialize};

use crate::allpass::low_pass1;

/// Number of delay lines in the network
pub const REVERB_LINES: usize = 4;

/// Default line lengths in samples, chosen prime so the lines share no
/// harmonic resonances
pub const DEFAULT_DELAY_LENGTHS: [usize; REVERB_LINES] = [887, 1279, 2089, 3167];

const DEFAULT_DECAY_LO: f64 = 1.5;
const DEFAULT_DECAY_HI: f64 = 0.7;

/// ln(1000), the T60 decay constant: a signal is "decayed" after dropping
/// 60 dB
const DECAY_CONST: f64 = 6.91;

/// Reverb configuration with recognized options
///
/// Per-line arrays are fixed-size so a length mismatch cannot be expressed.
/// `decay_hi` should stay below `decay_lo` for a physically sensible decay,
/// but only positivity is enforced; extreme ratios can produce audible
/// artifacts or an unstable tail, which is an accepted limitation rather
/// than a validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverbConfig {
    /// Feedback attenuation in (0, 1]
    pub gain: f64,
    /// Delay line lengths in samples
    pub delay_lengths: [usize; REVERB_LINES],
    /// Per-line weights on the summed output
    pub out_decays: [f64; REVERB_LINES],
    /// Per-line weights on the injected input
    pub in_decays: [f64; REVERB_LINES],
    /// Target decay time at DC, seconds
    pub decay_lo: f64,
    /// Target decay time at Nyquist, seconds
    pub decay_hi: f64,
    /// Cutoff of the low-pass ahead of the network, Hz
    pub pre_lowpass_cutoff: f64,
    /// Cutoff of the low-pass after the network, Hz
    pub post_lowpass_cutoff: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            gain: 1.0,
            delay_lengths: DEFAULT_DELAY_LENGTHS,
            out_decays: [0.8; REVERB_LINES],
            in_decays: [1.0; REVERB_LINES],
            decay_lo: DEFAULT_DECAY_LO,
            decay_hi: DEFAULT_DECAY_HI,
            pre_lowpass_cutoff: 12_000.0,
            post_lowpass_cutoff: 10_000.0,
        }
    }
}

impl ReverbConfig {
    /// Set feedback attenuation
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Set delay line lengths
    pub fn with_delay_lengths(mut self, lengths: [usize; REVERB_LINES]) -> Self {
        self.delay_lengths = lengths;
        self
    }

    /// Set target decay times at DC and Nyquist
    pub fn with_decays(mut self, decay_lo: f64, decay_hi: f64) -> Self {
        self.decay_lo = decay_lo;
        self.decay_hi = decay_hi;
        self
    }

    /// Set per-line output weights
    pub fn with_out_decays(mut self, out_decays: [f64; REVERB_LINES]) -> Self {
        self.out_decays = out_decays;
        self
    }

    /// Set per-line input weights
    pub fn with_in_decays(mut self, in_decays: [f64; REVERB_LINES]) -> Self {
        self.in_decays = in_decays;
        self
    }

    /// Set the pre- and post-network low-pass cutoffs
    pub fn with_cutoffs(mut self, pre: f64, post: f64) -> Self {
        self.pre_lowpass_cutoff = pre;
        self.post_lowpass_cutoff = post;
        self
    }

    /// Validate against the sampling frequency. Fails before any buffer is
    /// allocated; warns (but proceeds) on non-default decay times.
    pub fn validate(&self, fs: f64) -> MurmurResult<()> {
        if fs <= 0.0 || !fs.is_finite() {
            return Err(MurmurError::ParameterOutOfRange(format!(
                "sampling frequency must be positive, got {fs}"
            )));
        }
        if !(self.gain > 0.0 && self.gain <= 1.0) {
            return Err(MurmurError::ParameterOutOfRange(format!(
                "feedback gain must lie in (0, 1], got {}",
                self.gain
            )));
        }
        if self.delay_lengths.iter().any(|&l| l == 0) {
            return Err(MurmurError::ParameterOutOfRange(
                "delay line lengths must be positive".into(),
            ));
        }
        if self.decay_lo <= 0.0 || self.decay_hi <= 0.0 {
            return Err(MurmurError::ParameterOutOfRange(format!(
                "decay times must be positive, got lo {} s, hi {} s",
                self.decay_lo, self.decay_hi
            )));
        }
        let nyquist = fs / 2.0;
        for (name, cutoff) in [
            ("pre_lowpass_cutoff", self.pre_lowpass_cutoff),
            ("post_lowpass_cutoff", self.post_lowpass_cutoff),
        ] {
            if !(cutoff > 0.0 && cutoff < nyquist) {
                return Err(MurmurError::ParameterOutOfRange(format!(
                    "{name} must lie in (0, {nyquist}), got {cutoff}"
                )));
            }
        }
        if self.decay_lo != DEFAULT_DECAY_LO || self.decay_hi != DEFAULT_DECAY_HI {
            log::warn!(
                "non-default decay times (lo {} s, hi {} s) can produce audible artifacts or an unstable tail",
                self.decay_lo,
                self.decay_hi
            );
        }
        Ok(())
    }
}

/// Fixed-capacity circular buffer read at its full length (the oldest entry)
#[derive(Debug)]
struct DelayLine {
    buffer: Vec<Sample>,
    write_pos: usize,
}

impl DelayLine {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            write_pos: 0,
        }
    }

    /// The sample pushed `length` pushes ago (zero until the line fills)
    #[inline]
    fn read(&self) -> Sample {
        self.buffer[self.write_pos]
    }

    /// Push the newest sample, dropping the oldest
    #[inline]
    fn push(&mut self, sample: Sample) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }
}

/// One-pole damping filter `y[n] = g·x[n] - p·y[n-1]`, solved per line so
/// DC content decays at `decay_lo` and Nyquist content at `decay_hi`
/// regardless of the line's length.
#[derive(Debug, Clone, Copy)]
struct DampingFilter {
    g: Sample,
    p: Sample,
    state: Sample,
}

impl DampingFilter {
    fn new(length: usize, fs: f64, decay_lo: f64, decay_hi: f64) -> Self {
        let r_lo = 1.0 - (DECAY_CONST / (fs * decay_lo)) * length as f64;
        let r_hi = 1.0 - (DECAY_CONST / (fs * decay_hi)) * length as f64;
        let g = 2.0 * r_lo * r_hi / (r_lo + r_hi);
        let p = (r_lo - r_hi) / (r_lo + r_hi);
        log::debug!("damping for line of {length} samples: g {g:.6}, p {p:.6}");
        Self { g, p, state: 0.0 }
    }

    #[inline]
    fn process(&mut self, input: Sample) -> Sample {
        self.state = self.g * input - self.p * self.state;
        self.state
    }
}

/// Stautner-Puckette scattering matrix scaled by `gain / sqrt(2)`
fn scattering_matrix(gain: f64) -> [[Sample; REVERB_LINES]; REVERB_LINES] {
    let s = gain / std::f64::consts::SQRT_2;
    [
        [0.0, s, s, 0.0],
        [-s, 0.0, 0.0, -s],
        [s, 0.0, 0.0, -s],
        [0.0, s, -s, 0.0],
    ]
}

/// Stereo reverberated mix of `input` at wet/dry ratio `wet` in [0, 1].
///
/// Mono input is duplicated to stereo before mixing. The output is
/// `(wet · reverb + (1 - wet) · dry) / 2` per channel, with the mono reverb
/// signal duplicated across both channels.
pub fn reverb(input: &Signal, fs: f64, wet: f64, config: &ReverbConfig) -> MurmurResult<Signal> {
    input.validate()?;
    if !(0.0..=1.0).contains(&wet) {
        return Err(MurmurError::ParameterOutOfRange(format!(
            "wet/dry ratio must lie in [0, 1], got {wet}"
        )));
    }
    config.validate(fs)?;

    let dry = input.to_stereo();
    let mono = low_pass1(&dry.downmix_mono(), config.pre_lowpass_cutoff, fs)?;

    let mut lines = config.delay_lengths.map(DelayLine::new);
    let mut damping = config
        .delay_lengths
        .map(|l| DampingFilter::new(l, fs, config.decay_lo, config.decay_hi));
    let matrix = scattering_matrix(config.gain);

    // Tonal-correction constant for the one-zero output filter
    let ratio = config.decay_hi / config.decay_lo;
    let tc = (1.0 - ratio) / (1.0 + ratio);

    let x = mono.channel(0);
    let mut tail = vec![0.0; x.len()];
    let mut tonal_state = 0.0;
    for (n, out) in tail.iter_mut().enumerate() {
        // Oldest entry of each line
        let taps: [Sample; REVERB_LINES] = std::array::from_fn(|i| lines[i].read());

        let weighted = taps
            .iter()
            .zip(&config.out_decays)
            .map(|(tap, decay)| tap * decay)
            .sum::<Sample>()
            / REVERB_LINES as f64;
        let sample_out = (weighted - tc * tonal_state) / (1.0 - tc);
        tonal_state = sample_out;
        *out = sample_out;

        let damped: [Sample; REVERB_LINES] = std::array::from_fn(|i| damping[i].process(taps[i]));

        // Each line receives its share of the fresh input plus a scattered
        // mix of all four damped taps
        for (j, line) in lines.iter_mut().enumerate() {
            let mut feedback = config.in_decays[j] * x[n];
            for (i, tap) in damped.iter().enumerate() {
                feedback += matrix[j][i] * tap;
            }
            line.push(feedback);
        }
    }

    let tail = low_pass1(&Signal::mono(tail), config.post_lowpass_cutoff, fs)?;
    let tail = tail.to_stereo();

    let channels = (0..dry.channels())
        .map(|ch| {
            dry.channel(ch)
                .iter()
                .zip(tail.channel(ch))
                .map(|(d, w)| (wet * w + (1.0 - wet) * d) / 2.0)
                .collect()
        })
        .collect();
    Ok(Signal::from_channels(channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 44100.0;

    fn impulse_stereo(len: usize) -> Signal {
        let mut samples = vec![0.0; len];
        samples[0] = 1.0;
        Signal::stereo(samples.clone(), samples)
    }

    #[test]
    fn test_silence_in_silence_out() {
        let input = Signal::silence(4096, 2);
        let output = reverb(&input, FS, 0.7, &ReverbConfig::default()).unwrap();
        assert!(output.channel(0).iter().all(|s| *s == 0.0));
        assert!(output.channel(1).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_fully_dry_returns_halved_input() {
        let left: Vec<f64> = (0..512).map(|i| (i as f64 * 0.05).sin()).collect();
        let right: Vec<f64> = (0..512).map(|i| (i as f64 * 0.07).cos()).collect();
        let input = Signal::stereo(left.clone(), right.clone());
        let output = reverb(&input, FS, 0.0, &ReverbConfig::default()).unwrap();
        for (out, inp) in output.channel(0).iter().zip(&left) {
            assert!((out - inp / 2.0).abs() < 1e-12);
        }
        for (out, inp) in output.channel(1).iter().zip(&right) {
            assert!((out - inp / 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fully_wet_is_mono_across_channels() {
        let left: Vec<f64> = (0..4096).map(|i| (i as f64 * 0.05).sin()).collect();
        let right: Vec<f64> = (0..4096).map(|i| (i as f64 * 0.07).cos()).collect();
        let input = Signal::stereo(left, right);
        let output = reverb(&input, FS, 1.0, &ReverbConfig::default()).unwrap();
        // The wet path is a duplicated mono signal
        assert_eq!(output.channel(0), output.channel(1));
    }

    #[test]
    fn test_impulse_causality() {
        // No network energy may surface before the shortest line has filled
        let shortest = DEFAULT_DELAY_LENGTHS[0];
        let input = impulse_stereo(shortest + 64);
        let output = reverb(&input, FS, 1.0, &ReverbConfig::default()).unwrap();
        for (n, s) in output.channel(0).iter().enumerate().take(shortest) {
            assert!(*s == 0.0, "energy at sample {n} before delay {shortest}");
        }
        assert!(
            output.channel(0)[shortest..].iter().any(|s| s.abs() > 0.0),
            "no energy after the shortest delay"
        );
    }

    #[test]
    fn test_determinism() {
        let input = Signal::stereo(
            (0..2048).map(|i| ((i * 7 % 37) as f64 - 18.0) / 18.0).collect(),
            (0..2048).map(|i| ((i * 11 % 41) as f64 - 20.0) / 20.0).collect(),
        );
        let config = ReverbConfig::default();
        let first = reverb(&input, FS, 0.5, &config).unwrap();
        let second = reverb(&input, FS, 0.5, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mono_input_accepted() {
        let input = Signal::mono(vec![1.0, 0.0, 0.0, 0.0]);
        let output = reverb(&input, FS, 0.5, &ReverbConfig::default()).unwrap();
        assert_eq!(output.channels(), 2);
        assert_eq!(output.frames(), 4);
    }

    #[test]
    fn test_tail_decays_with_default_config() {
        let input = impulse_stereo(44100 * 3);
        let output = reverb(&input, FS, 1.0, &ReverbConfig::default()).unwrap();
        let early: f64 = output.channel(0)[..44100]
            .iter()
            .map(|s| s * s)
            .sum();
        let late: f64 = output.channel(0)[44100 * 2..]
            .iter()
            .map(|s| s * s)
            .sum();
        assert!(early > 0.0);
        assert!(late < early, "tail gained energy: {late} >= {early}");
        assert!(output.channel(0).iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_config_validation() {
        let fs = FS;
        assert!(ReverbConfig::default().validate(fs).is_ok());
        assert!(ReverbConfig::default().with_gain(0.0).validate(fs).is_err());
        assert!(ReverbConfig::default().with_gain(1.5).validate(fs).is_err());
        assert!(
            ReverbConfig::default()
                .with_delay_lengths([887, 0, 2089, 3167])
                .validate(fs)
                .is_err()
        );
        assert!(
            ReverbConfig::default()
                .with_decays(-1.0, 0.7)
                .validate(fs)
                .is_err()
        );
        assert!(
            ReverbConfig::default()
                .with_cutoffs(12_000.0, fs)
                .validate(fs)
                .is_err()
        );
        // Non-default decay times warn but validate
        assert!(
            ReverbConfig::default()
                .with_decays(2.0, 0.5)
                .validate(fs)
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_out_of_range_wet() {
        let input = Signal::silence(64, 2);
        for wet in [-0.1, 1.1] {
            assert!(matches!(
                reverb(&input, FS, wet, &ReverbConfig::default()),
                Err(MurmurError::ParameterOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_delay_line_offset() {
        let mut line = DelayLine::new(4);
        line.push(1.0);
        for _ in 0..3 {
            assert_eq!(line.read(), 0.0);
            line.push(0.0);
        }
        // The impulse surfaces exactly `length` pushes later
        assert_eq!(line.read(), 1.0);
        line.push(0.0);
        assert_eq!(line.read(), 0.0);
    }

    #[test]
    fn test_damping_solves_target_decay_rates() {
        // g and p are solved so the filter's extreme-frequency gains land on
        // the two per-line decay rates: g/(1-p) = r_lo and g/(1+p) = r_hi
        let length = 887;
        let filter = DampingFilter::new(length, FS, 1.5, 0.7);
        let r_lo = 1.0 - (DECAY_CONST / (FS * 1.5)) * length as f64;
        let r_hi = 1.0 - (DECAY_CONST / (FS * 0.7)) * length as f64;
        assert!((filter.g / (1.0 - filter.p) - r_lo).abs() < 1e-12);
        assert!((filter.g / (1.0 + filter.p) - r_hi).abs() < 1e-12);
        assert!(filter.p.abs() < 1.0, "unstable damping pole");
        assert!(filter.g.abs() < 1.0, "damping amplifies");
    }

    #[test]
    fn test_scattering_matrix_scaling() {
        let m = scattering_matrix(0.5);
        let s = 0.5 / std::f64::consts::SQRT_2;
        assert_eq!(m[0][1], s);
        assert_eq!(m[1][0], -s);
        // Zero diagonal, Stautner-Puckette structure
        for (i, row) in m.iter().enumerate() {
            assert_eq!(row[i], 0.0);
        }
    }
}
