// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, info};
use wave_config::{ChatMode, Config, FramingConfig, Persona};
use wave_stream::{CancellationToken, Clock, StreamError, StreamOutcome, StreamSimulator, StreamingOptions};

use crate::responder::call_with_timeout;
use crate::{Framing, HistoryTurn, HttpResponder, KnowledgeBase, Message, Responder, ResponderRequest, Rule};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HISTORY_WINDOW: usize = 6;

/// Per-persona cadence used when config leaves delays unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaProfile {
    pub typing_ms: (u64, u64),
    pub thinking_ms: (u64, u64),
}

impl PersonaProfile {
    pub fn for_persona(persona: Persona) -> Self {
        match persona {
            Persona::Landing => Self { typing_ms: (20, 60), thinking_ms: (600, 1400) },
            Persona::Support => Self { typing_ms: (15, 45), thinking_ms: (400, 1000) },
            Persona::App => Self { typing_ms: (30, 80), thinking_ms: (600, 1400) },
        }
    }
}

/// Where a response cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Idle,
    Thinking,
    Resolving,
    Streaming,
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BotState::Idle => "idle",
            BotState::Thinking => "thinking",
            BotState::Resolving => "resolving",
            BotState::Streaming => "streaming",
        };
        f.write_str(s)
    }
}

/// Puts the bot back to [`BotState::Idle`] however the cycle ends,
/// including when its future is dropped.
struct IdleOnDrop<'a>(&'a watch::Sender<BotState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(BotState::Idle);
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

pub struct BotBuilder {
    knowledge: KnowledgeBase,
    responder: Option<Arc<dyn Responder>>,
    streaming: StreamingOptions,
    thinking: (Duration, Duration),
    framing: FramingConfig,
    seed: Option<u64>,
    clock: Option<Arc<dyn Clock>>,
    timeout: Duration,
    history_window: usize,
    mode: ChatMode,
}

impl BotBuilder {
    fn new(knowledge: KnowledgeBase) -> Self {
        let profile = PersonaProfile::for_persona(Persona::Landing);
        Self {
            knowledge,
            responder: None,
            streaming: StreamingOptions::new(
                Duration::from_millis(profile.typing_ms.0),
                Duration::from_millis(profile.typing_ms.1),
            ),
            thinking: (
                Duration::from_millis(profile.thinking_ms.0),
                Duration::from_millis(profile.thinking_ms.1),
            ),
            framing: FramingConfig::default(),
            seed: None,
            clock: None,
            timeout: DEFAULT_TIMEOUT,
            history_window: DEFAULT_HISTORY_WINDOW,
            mode: ChatMode::Chat,
        }
    }

    /// Consult `responder` before the canned knowledge.
    pub fn responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn streaming(mut self, options: StreamingOptions) -> Self {
        self.streaming = options;
        self
    }

    /// Range the thinking pause is drawn from.
    pub fn thinking(mut self, min: Duration, max: Duration) -> Self {
        self.thinking = (min, max);
        self
    }

    pub fn framing(mut self, framing: FramingConfig) -> Self {
        self.framing = framing;
        self
    }

    /// Seed every random choice: framing, encouragements, delays.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Upper bound on a single responder call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of trailing messages forwarded with chat requests.
    pub fn history_window(mut self, n: usize) -> Self {
        self.history_window = n;
        self
    }

    /// Chat mode reported by [`Bot::mode`] for callers that keep none.
    pub fn mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate the cadence and assemble the bot.
    pub fn build(self) -> Result<Bot, StreamError> {
        self.streaming.validate()?;
        let (min, max) = self.thinking;
        if min > max {
            return Err(StreamError::InvalidThinkingRange { min, max });
        }

        let simulator = match self.clock {
            Some(clock) => StreamSimulator::with_clock(clock),
            None => StreamSimulator::new(),
        };
        let (simulator, rng) = match self.seed {
            Some(seed) => (simulator.seeded(seed.wrapping_add(1)), StdRng::seed_from_u64(seed)),
            None => (simulator, StdRng::from_entropy()),
        };
        let framing = Framing::new(self.knowledge.style(), &self.framing);
        let (state, _) = watch::channel(BotState::Idle);

        debug!(
            knowledge = self.knowledge.name(),
            responder = ?self.responder.as_ref().map(|r| r.name()),
            "bot ready"
        );

        Ok(Bot {
            knowledge: self.knowledge,
            framing,
            responder: self.responder,
            simulator,
            streaming: self.streaming,
            thinking: self.thinking,
            timeout: self.timeout,
            history_window: self.history_window,
            mode: self.mode,
            rng: Mutex::new(rng),
            state,
        })
    }
}

// ─── Bot ─────────────────────────────────────────────────────────────────────

/// Keyword-routed assistant with optional network responder.
///
/// A response cycle moves `Idle → Thinking → Resolving → Streaming → Idle`.
/// Resolving never fails: a responder error, timeout, or blank reply falls
/// back to the canned answer.
pub struct Bot {
    knowledge: KnowledgeBase,
    framing: Framing,
    responder: Option<Arc<dyn Responder>>,
    simulator: StreamSimulator,
    streaming: StreamingOptions,
    thinking: (Duration, Duration),
    timeout: Duration,
    history_window: usize,
    mode: ChatMode,
    rng: Mutex<StdRng>,
    state: watch::Sender<BotState>,
}

impl Bot {
    pub fn builder(knowledge: KnowledgeBase) -> BotBuilder {
        BotBuilder::new(knowledge)
    }

    /// Bot described by `config`: persona knowledge (or the configured
    /// knowledge file), cadence, framing, and the HTTP responder when
    /// enabled.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let bot_cfg = &config.bot;
        let knowledge = match &bot_cfg.knowledge_file {
            Some(path) => KnowledgeBase::from_file(path)
                .with_context(|| format!("loading knowledge file {path}"))?,
            None => KnowledgeBase::builtin(bot_cfg.persona).context("loading built-in knowledge")?,
        };

        let profile = PersonaProfile::for_persona(bot_cfg.persona);
        let streaming = StreamingOptions::from_config(&config.streaming, profile.typing_ms.0, profile.typing_ms.1);
        let thinking = (
            Duration::from_millis(config.thinking.min_ms.unwrap_or(profile.thinking_ms.0)),
            Duration::from_millis(config.thinking.max_ms.unwrap_or(profile.thinking_ms.1)),
        );

        let mut builder = Bot::builder(knowledge)
            .streaming(streaming)
            .thinking(thinking.0, thinking.1)
            .framing(bot_cfg.framing.clone())
            .timeout(Duration::from_secs(config.responder.timeout_secs))
            .history_window(bot_cfg.history_window)
            .mode(config.responder.chat_mode);
        if let Some(seed) = bot_cfg.seed {
            builder = builder.seed(seed);
        }
        if config.responder.enabled {
            let http = HttpResponder::from_config(&config.responder)?;
            info!(base_url = http.base_url(), "network responder enabled");
            builder = builder.responder(Arc::new(http));
        }
        Ok(builder.build()?)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn streaming_options(&self) -> &StreamingOptions {
        &self.streaming
    }

    pub fn state(&self) -> BotState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<BotState> {
        self.state.subscribe()
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    pub fn resolve_keyword_match(&self, text: &str) -> Option<&Rule> {
        self.knowledge.resolve_keyword_match(text)
    }

    /// Humanized canned answer without random framing.
    pub fn canonical_response(&self, text: &str) -> String {
        self.knowledge.humanizer().apply(self.knowledge.response_for(text))
    }

    /// Canned answer with random framing.
    pub fn generate_response(&self, text: &str) -> String {
        let canonical = self.canonical_response(text);
        self.with_rng(|rng| self.framing.frame(&canonical, rng))
    }

    /// Network answer when a responder is configured, otherwise (or on any
    /// failure) the canned answer.  Never empty.
    pub async fn resolve_response(&self, text: &str, history: &[Message], mode: ChatMode) -> String {
        let Some(responder) = self.responder.as_deref() else {
            return self.generate_response(text);
        };
        if text.trim().is_empty() {
            return self.generate_response(text);
        }

        // The window counts only turns that carry text.
        let mut window: Vec<HistoryTurn> = history
            .iter()
            .rev()
            .filter(|m| !m.content.is_empty())
            .take(self.history_window)
            .map(HistoryTurn::from)
            .collect();
        window.reverse();
        let request = ResponderRequest::Chat { message: text.trim().to_string(), mode, history: window };
        match call_with_timeout(responder, request, self.timeout).await {
            Some(reply) => reply,
            None => {
                info!("falling back to canned response");
                self.generate_response(text)
            }
        }
    }

    /// One full response cycle: think, resolve, then type the answer out
    /// through `on_chunk`.
    ///
    /// Cancelling `cancel` at any point ends the cycle with
    /// [`StreamOutcome::Cancelled`]; no terminal chunk is delivered.
    pub async fn generate_streaming_response<F>(
        &self,
        text: &str,
        history: &[Message],
        mode: ChatMode,
        on_chunk: F,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError>
    where
        F: FnMut(&str, bool),
    {
        let _idle = IdleOnDrop(&self.state);

        self.state.send_replace(BotState::Thinking);
        let pause = self.simulator.thinking_duration(self.thinking.0, self.thinking.1);
        if !self.simulator.simulate_thinking(pause, cancel).await {
            return Ok(StreamOutcome::Cancelled { revealed: String::new() });
        }

        self.state.send_replace(BotState::Resolving);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled { revealed: String::new() }),
            r = self.resolve_response(text, history, mode) => r,
        };

        self.state.send_replace(BotState::Streaming);
        debug!(chars = response.chars().count(), "streaming response");
        self.simulator
            .stream_text(&response, on_chunk, &self.streaming, cancel)
            .await
    }

    /// Suggested next questions for `text`.
    pub fn follow_up_suggestions(&self, text: &str) -> &[String] {
        self.knowledge.follow_up_suggestions(text)
    }

    /// A random encouragement, if the knowledge base has any.
    pub fn encouraging_message(&self) -> Option<&str> {
        self.with_rng(|rng| self.knowledge.encouragements().choose(rng))
            .map(String::as_str)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
