// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Serde default helper — returns `true`.
///
/// `#[serde(default)]` on a `bool` always falls back to `bool::default()`
/// (i.e. `false`), so a named function is required.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub thinking: ThinkingConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub responder: ResponderConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

// ─── Streaming ───────────────────────────────────────────────────────────────

/// Unit of reveal used by the typing simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Long words are typed one character at a time when
    /// `human_typing_speed` is on.
    #[default]
    Char,
    /// Every word appears in one step.
    Word,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Char => write!(f, "char"),
            Granularity::Word => write!(f, "word"),
        }
    }
}

/// Typing cadence.  Unset delays fall back to the persona's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Lower bound of the per-step delay in milliseconds
    #[serde(default)]
    pub min_delay_ms: Option<u64>,
    /// Upper bound of the per-step delay in milliseconds
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    #[serde(default)]
    pub granularity: Granularity,
    /// Reveal long words character by character with class-based delays
    #[serde(default = "default_true")]
    pub human_typing_speed: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: None,
            max_delay_ms: None,
            granularity: Granularity::Char,
            human_typing_speed: true,
        }
    }
}

/// Jittered pause before the first chunk is revealed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(default)]
    pub min_ms: Option<u64>,
    #[serde(default)]
    pub max_ms: Option<u64>,
}

// ─── Bot ─────────────────────────────────────────────────────────────────────

/// Which built-in knowledge base (and cadence profile) the bot uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Marketing-site Q&A bot: short answers, slower typing
    #[default]
    Landing,
    /// In-app support bot: long answers, faster typing
    Support,
    /// Main-app assistant: short product answers at the default cadence
    App,
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Persona::Landing => write!(f, "landing"),
            Persona::Support => write!(f, "support"),
            Persona::App => write!(f, "app"),
        }
    }
}

/// Mode forwarded to the backend chat endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// General life and product guidance
    #[default]
    Chat,
    /// Business idea analysis
    Idea,
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatMode::Chat => write!(f, "chat"),
            ChatMode::Idea => write!(f, "idea"),
        }
    }
}

fn default_history_window() -> usize {
    6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub persona: Persona,
    /// Path to a YAML knowledge base replacing the persona's built-in one
    #[serde(default)]
    pub knowledge_file: Option<String>,
    /// Number of trailing messages forwarded to the backend with each chat
    /// request
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Fixed RNG seed.  Makes framing and typing jitter reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub framing: FramingConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            persona: Persona::Landing,
            knowledge_file: None,
            history_window: default_history_window(),
            seed: None,
            framing: FramingConfig::default(),
        }
    }
}

fn default_starter_probability() -> f64 {
    0.2
}
fn default_connector_probability() -> f64 {
    0.3
}
fn default_connector_min_chars() -> usize {
    200
}

/// Probabilities for the randomized conversational prefix and connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramingConfig {
    #[serde(default = "default_starter_probability")]
    pub starter_probability: f64,
    #[serde(default = "default_connector_probability")]
    pub connector_probability: f64,
    /// Responses at or below this many characters never get a connector
    #[serde(default = "default_connector_min_chars")]
    pub connector_min_chars: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            starter_probability: default_starter_probability(),
            connector_probability: default_connector_probability(),
            connector_min_chars: default_connector_min_chars(),
        }
    }
}

// ─── Responder ───────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://localhost:5000".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// Backend used for network-assisted answers and the idea flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Route chat answers through the backend before the canned knowledge
    #[serde(default)]
    pub enabled: bool,
    /// Overridden by the WAVE_BACKEND_URL environment variable
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Requests slower than this fall back to local text
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub chat_mode: ChatMode,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            chat_mode: ChatMode::Chat,
        }
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding the idea text and saved conversation.
    /// Defaults to `$XDG_DATA_HOME/wave/store.json`.
    #[serde(default)]
    pub path: Option<String>,
}

impl StoreConfig {
    pub fn resolved_path(&self) -> std::path::PathBuf {
        match &self.path {
            Some(p) => std::path::PathBuf::from(p),
            None => dirs::data_dir()
                .unwrap_or_else(|| {
                    dirs::home_dir()
                        .unwrap_or_else(|| std::path::PathBuf::from("."))
                        .join(".local")
                        .join("share")
                })
                .join("wave")
                .join("store.json"),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
