// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::Duration;

use wave_config::{Granularity, StreamingConfig};

use crate::StreamError;

/// Words at or below this many characters are always revealed whole.
const PER_CHAR_MIN_LEN: usize = 4;

/// Cadence for a single [`stream_text`](crate::StreamSimulator::stream_text) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingOptions {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub granularity: Granularity,
    pub human_typing_speed: bool,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self::new(Duration::from_millis(30), Duration::from_millis(80))
    }
}

impl StreamingOptions {
    /// Character granularity with human typing speed enabled.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            granularity: Granularity::Char,
            human_typing_speed: true,
        }
    }

    /// Build from config, filling unset delays with `default_min_ms` /
    /// `default_max_ms`.
    pub fn from_config(cfg: &StreamingConfig, default_min_ms: u64, default_max_ms: u64) -> Self {
        Self {
            min_delay: Duration::from_millis(cfg.min_delay_ms.unwrap_or(default_min_ms)),
            max_delay: Duration::from_millis(cfg.max_delay_ms.unwrap_or(default_max_ms)),
            granularity: cfg.granularity,
            human_typing_speed: cfg.human_typing_speed,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_human_typing_speed(mut self, on: bool) -> Self {
        self.human_typing_speed = on;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.min_delay > self.max_delay {
            return Err(StreamError::InvalidOptions {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// Whether `word` is typed one character at a time.
    pub(crate) fn reveals_per_char(&self, word: &str) -> bool {
        self.granularity == Granularity::Char
            && self.human_typing_speed
            && word.chars().count() >= PER_CHAR_MIN_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_thirty_to_eighty_ms() {
        let o = StreamingOptions::default();
        assert_eq!(o.min_delay, Duration::from_millis(30));
        assert_eq!(o.max_delay, Duration::from_millis(80));
        assert!(o.human_typing_speed);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn inverted_range_fails_validation() {
        let o = StreamingOptions::new(Duration::from_millis(50), Duration::from_millis(10));
        assert_eq!(
            o.validate(),
            Err(StreamError::InvalidOptions {
                min: Duration::from_millis(50),
                max: Duration::from_millis(10),
            })
        );
    }

    #[test]
    fn equal_bounds_are_valid() {
        let o = StreamingOptions::new(Duration::from_millis(1), Duration::from_millis(1));
        assert!(o.validate().is_ok());
    }

    #[test]
    fn per_char_only_for_long_words_in_char_mode() {
        let o = StreamingOptions::default();
        assert!(!o.reveals_per_char("abc"));
        assert!(o.reveals_per_char("abcd"));
        // Multi-byte characters are counted as characters, not bytes.
        assert!(!o.reveals_per_char("🌊🌊"));

        let off = o.clone().with_human_typing_speed(false);
        assert!(!off.reveals_per_char("abcdef"));

        let word = o.with_granularity(Granularity::Word);
        assert!(!word.reveals_per_char("abcdef"));
    }

    #[test]
    fn config_fills_missing_delays_from_defaults() {
        let cfg = StreamingConfig {
            min_delay_ms: None,
            max_delay_ms: Some(90),
            granularity: Granularity::Word,
            human_typing_speed: false,
        };
        let o = StreamingOptions::from_config(&cfg, 20, 60);
        assert_eq!(o.min_delay, Duration::from_millis(20));
        assert_eq!(o.max_delay, Duration::from_millis(90));
        assert_eq!(o.granularity, Granularity::Word);
        assert!(!o.human_typing_speed);
    }
}
