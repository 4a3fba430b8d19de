//! mm-core: Shared types and utilities for Murmur
//!
//! This crate provides the foundational types used across the Murmur crates:
//! the `Sample`/`Signal` buffer types, the error taxonomy, level conversion
//! helpers, and peak normalization.

mod error;
mod level;
mod normalize;
mod sample;

pub use error::*;
pub use level::*;
pub use normalize::*;
pub use sample::*;
