//! Generic difference-equation filter
//!
//! Evaluates a linear time-invariant filter from explicit feed-forward and
//! feed-backward tap vectors:
//!
//! `y[n] = (1/b0) * (Σ f[i]·x[n-i] − Σ_{j≥1} b[j]·y[n-j])`
//!
//! References to negative sample indices read zero (the filter starts from a
//! zero state). Channels are processed independently; within a channel the
//! output recursion is strictly sequential in `n`.

use mm_core::{MurmurError, MurmurResult, Sample, Signal};

fn check_taps(name: &str, taps: &[Sample]) -> MurmurResult<()> {
    if taps.is_empty() || taps.iter().all(|t| *t == 0.0) {
        return Err(MurmurError::InvalidCoefficients(format!(
            "{name} taps must contain at least one non-zero entry"
        )));
    }
    Ok(())
}

/// Apply the difference equation defined by `forward` and `backward` taps.
/// `backward[0]` normalizes the recursion and must be non-zero.
pub fn difference_equation(
    forward: &[Sample],
    backward: &[Sample],
    input: &Signal,
) -> MurmurResult<Signal> {
    input.validate()?;
    check_taps("forward", forward)?;
    check_taps("backward", backward)?;
    let b0 = backward[0];
    if b0 == 0.0 {
        return Err(MurmurError::InvalidCoefficients(
            "backward[0] is used as a divisor and must be non-zero".into(),
        ));
    }

    let frames = input.frames();
    let mut channels = Vec::with_capacity(input.channels());
    for ch in 0..input.channels() {
        let x = input.channel(ch);
        let mut y = vec![0.0; frames];
        for n in 0..frames {
            let mut acc = 0.0;
            for (i, f) in forward.iter().enumerate() {
                if i <= n {
                    acc += f * x[n - i];
                }
            }
            for (j, b) in backward.iter().enumerate().skip(1) {
                if j <= n {
                    acc -= b * y[n - j];
                }
            }
            y[n] = acc / b0;
        }
        channels.push(y);
    }
    Ok(Signal::from_channels(channels))
}
