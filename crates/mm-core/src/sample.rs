//! Sample type and the planar `Signal` buffer
//!
//! A `Signal` is an owned, planar (channel-major) buffer of `frames` samples
//! across one or two channels. Processors read input signals and allocate new
//! owned output signals; inputs are never mutated in place.

use crate::{MurmurError, MurmurResult};

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Maximum channel count supported by the core processors
pub const MAX_CHANNELS: usize = 2;

/// Planar audio buffer, `frames` samples × 1 or 2 channels
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: Vec<Vec<Sample>>,
}

impl Signal {
    /// Single-channel signal
    pub fn mono(samples: Vec<Sample>) -> Self {
        Self {
            channels: vec![samples],
        }
    }

    /// Two-channel signal. Channel lengths must match; `validate` rejects
    /// ragged signals at processor entry.
    pub fn stereo(left: Vec<Sample>, right: Vec<Sample>) -> Self {
        Self {
            channels: vec![left, right],
        }
    }

    /// Signal from an explicit channel-major buffer
    pub fn from_channels(channels: Vec<Vec<Sample>>) -> Self {
        Self { channels }
    }

    /// Zero-filled signal
    pub fn silence(frames: usize, channels: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channels],
        }
    }

    /// Number of samples per channel
    #[inline]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Borrow one channel's samples
    #[inline]
    pub fn channel(&self, index: usize) -> &[Sample] {
        &self.channels[index]
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> Sample {
        self.channels
            .iter()
            .flatten()
            .fold(0.0, |peak, s| peak.max(s.abs()))
    }

    /// Downmix to mono: `(L[n] + R[n]) / 2`. Mono signals are returned as a
    /// copy.
    pub fn downmix_mono(&self) -> Signal {
        if self.channels.len() == 1 {
            return self.clone();
        }
        let left = &self.channels[0];
        let right = &self.channels[1];
        let mixed = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| (l + r) / 2.0)
            .collect();
        Signal::mono(mixed)
    }

    /// Duplicate a mono signal across both channels. Stereo signals are
    /// returned as a copy.
    pub fn to_stereo(&self) -> Signal {
        if self.channels.len() == 2 {
            return self.clone();
        }
        Signal::stereo(self.channels[0].clone(), self.channels[0].clone())
    }

    /// Check the signal contract: 1 or 2 channels of equal, non-zero length
    /// with finite sample values. A signal with more channels than samples is
    /// likely a transposed buffer; that case is a non-fatal advisory.
    pub fn validate(&self) -> MurmurResult<()> {
        if self.channels.is_empty() || self.channels.len() > MAX_CHANNELS {
            return Err(MurmurError::InvalidSignal(format!(
                "expected 1 or 2 channels, got {}",
                self.channels.len()
            )));
        }

        let frames = self.channels[0].len();
        if frames == 0 {
            return Err(MurmurError::InvalidSignal(
                "signal contains no samples".into(),
            ));
        }

        for (index, channel) in self.channels.iter().enumerate() {
            if channel.len() != frames {
                return Err(MurmurError::InvalidSignal(format!(
                    "channel {index} has {} samples, expected {frames}",
                    channel.len()
                )));
            }
            if channel.iter().any(|s| !s.is_finite()) {
                return Err(MurmurError::InvalidSignal(format!(
                    "channel {index} contains a non-finite sample"
                )));
            }
        }

        if self.channels.len() > frames {
            log::warn!(
                "signal has more channels ({}) than samples ({frames}); buffer may be transposed",
                self.channels.len()
            );
        }

        Ok(())
    }
}
