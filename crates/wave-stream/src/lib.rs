// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Human-like typing simulation.
//!
//! [`StreamSimulator::stream_text`] reveals a finished string through a
//! callback as if someone were typing it: word by word, or character by
//! character for longer words, with randomized delays and longer pauses
//! after punctuation.  Every chunk is a prefix of the next one and the
//! final chunk, flagged `is_complete = true`, carries the full text.
//!
//! Timers go through the [`Clock`] trait so tests can substitute a
//! [`ManualClock`] that records delays instead of waiting for them.
mod clock;
pub mod delay;
mod error;
mod options;
mod simulator;

pub use clock::{Clock, ManualClock, TokioClock};
pub use error::StreamError;
pub use options::StreamingOptions;
pub use simulator::{Chunk, StreamOutcome, StreamSimulator};
pub use tokio_util::sync::CancellationToken;
pub use wave_config::Granularity;
