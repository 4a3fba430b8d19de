//! mm-dsp: Offline audio effect processors for Murmur
//!
//! Whole-buffer transforms over `mm_core::Signal`. Every entry point
//! validates its inputs eagerly and returns a freshly allocated output
//! signal; all filter state is call-local.
//!
//! ## Modules
//! - `difference` - generic difference-equation (FIR/IIR) filter
//! - `allpass` - first-order tunable all-pass plus derived low/high-pass and shelf filters
//! - `reverb` - four-line feedback delay network reverb

pub mod allpass;
pub mod difference;
pub mod reverb;
