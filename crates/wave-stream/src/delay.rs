// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Delay policy for the typing simulator.
//!
//! All draws are independent, inclusive, whole-millisecond uniform samples.
use std::time::Duration;

use rand::Rng;

use crate::StreamingOptions;

/// Pause after a word ending in `. ! ? :`.
pub const LONG_PAUSE_MS: (u64, u64) = (200, 400);
/// Pause after a word ending in `, ;`.
pub const MEDIUM_PAUSE_MS: (u64, u64) = (100, 200);

const COMPLEX_CHARS: &[char] = &[
    '{', '}', '[', ']', '(', ')', '<', '>', '|', '\\', '/', '@', '#', '$', '%', '^', '&', '*',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Brackets and symbols that take a typist longer to find
    Complex,
    /// ASCII letters and digits
    Alphanumeric,
    /// Everything else (punctuation, emoji, non-ASCII letters)
    Other,
}

pub fn classify(c: char) -> CharClass {
    if COMPLEX_CHARS.contains(&c) {
        CharClass::Complex
    } else if c.is_ascii_alphanumeric() {
        CharClass::Alphanumeric
    } else {
        CharClass::Other
    }
}

/// Uniform draw in `[min, max]` at millisecond resolution.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    uniform_ms(rng, millis(min), millis(max))
}

fn uniform_ms<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> Duration {
    if min >= max {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rng.gen_range(min..=max))
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn scaled(d: Duration, factor: f64) -> u64 {
    (millis(d) as f64 * factor).round() as u64
}

/// Delay after typing `c` in per-character mode.
pub fn char_delay<R: Rng + ?Sized>(rng: &mut R, c: char, opts: &StreamingOptions) -> Duration {
    match classify(c) {
        CharClass::Complex => {
            uniform_ms(rng, scaled(opts.max_delay, 1.5), scaled(opts.max_delay, 2.0))
        }
        CharClass::Alphanumeric => uniform(rng, opts.min_delay, opts.max_delay),
        CharClass::Other => {
            uniform_ms(rng, scaled(opts.min_delay, 1.2), scaled(opts.max_delay, 1.2))
        }
    }
}

/// Delay after the space that follows `word`.
pub fn pause_after<R: Rng + ?Sized>(rng: &mut R, word: &str, opts: &StreamingOptions) -> Duration {
    match word.chars().last() {
        Some('.' | '!' | '?' | ':') => uniform_ms(rng, LONG_PAUSE_MS.0, LONG_PAUSE_MS.1),
        Some(',' | ';') => uniform_ms(rng, MEDIUM_PAUSE_MS.0, MEDIUM_PAUSE_MS.1),
        _ => uniform(rng, opts.min_delay, opts.max_delay),
    }
}
