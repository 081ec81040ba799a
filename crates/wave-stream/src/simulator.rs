// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{delay, Clock, StreamError, StreamingOptions, TokioClock};

/// One incremental reveal.  `text` is everything revealed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub is_complete: bool,
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The terminal `is_complete = true` chunk was delivered.
    Completed { text: String },
    /// The token fired first.  `revealed` is the last prefix delivered and no
    /// terminal chunk was sent.
    Cancelled { revealed: String },
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            StreamOutcome::Completed { text } => text,
            StreamOutcome::Cancelled { revealed } => revealed,
        }
    }
}

/// Reveals finished text with human-like typing cadence.
pub struct StreamSimulator {
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl Default for StreamSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSimulator {
    /// Real timers, entropy-seeded jitter.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(TokioClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the jitter source with a seeded one.
    pub fn seeded(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Suspend for `delay` unless `cancel` fires first.  Returns `false` when
    /// cancelled.
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = self.clock.sleep(delay) => true,
        }
    }

    /// Jittered thinking time in `[min, max]`.
    pub fn thinking_duration(&self, min: Duration, max: Duration) -> Duration {
        self.draw(|rng| delay::uniform(rng, min, max))
    }

    /// A single suspend with no output.  Returns `false` when cancelled.
    pub async fn simulate_thinking(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        trace!(?duration, "thinking");
        self.pause(duration, cancel).await
    }

    /// Reveal `text` through `on_chunk(revealed_prefix, is_complete)`.
    ///
    /// The text is split on single spaces.  Each word is revealed whole, or
    /// one character at a time when the options ask for per-character typing
    /// and the word is longer than three characters.  A single space follows
    /// every word except the last, with a longer pause after sentence
    /// punctuation.  The last call carries the full text with
    /// `is_complete = true`; it is the only completion signal and is never
    /// sent for a cancelled stream.
    pub async fn stream_text<F>(
        &self,
        text: &str,
        mut on_chunk: F,
        options: &StreamingOptions,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError>
    where
        F: FnMut(&str, bool),
    {
        options.validate()?;

        let words: Vec<&str> = text.split(' ').collect();
        let last = words.len() - 1;
        debug!(chars = text.chars().count(), words = words.len(), "streaming text");

        let mut revealed = String::with_capacity(text.len());
        if cancel.is_cancelled() {
            return Ok(StreamOutcome::Cancelled { revealed });
        }

        for (i, word) in words.iter().enumerate() {
            if options.reveals_per_char(word) {
                for c in word.chars() {
                    revealed.push(c);
                    on_chunk(&revealed, false);
                    let d = self.draw(|rng| delay::char_delay(rng, c, options));
                    if !self.pause(d, cancel).await {
                        return Ok(cancelled(revealed));
                    }
                }
            } else {
                revealed.push_str(word);
                on_chunk(&revealed, false);
                let d = self.draw(|rng| delay::uniform(rng, options.min_delay, options.max_delay));
                if !self.pause(d, cancel).await {
                    return Ok(cancelled(revealed));
                }
            }

            if i < last {
                revealed.push(' ');
                on_chunk(&revealed, false);
                let d = self.draw(|rng| delay::pause_after(rng, word, options));
                if !self.pause(d, cancel).await {
                    return Ok(cancelled(revealed));
                }
            }
        }

        debug_assert_eq!(revealed, text);
        on_chunk(&revealed, true);
        Ok(StreamOutcome::Completed { text: revealed })
    }

    /// Like [`stream_text`](Self::stream_text) but forwards [`Chunk`]s into
    /// a channel.  Dropping the receiver cancels the stream.
    pub async fn stream_to_channel(
        &self,
        text: &str,
        tx: mpsc::UnboundedSender<Chunk>,
        options: &StreamingOptions,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError> {
        let child = cancel.child_token();
        let on_chunk = |revealed: &str, is_complete: bool| {
            let chunk = Chunk { text: revealed.to_string(), is_complete };
            if tx.send(chunk).is_err() {
                child.cancel();
            }
        };
        self.stream_text(text, on_chunk, options, &child).await
    }
}

fn cancelled(revealed: String) -> StreamOutcome {
    debug!(revealed_chars = revealed.chars().count(), "stream cancelled");
    StreamOutcome::Cancelled { revealed }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
