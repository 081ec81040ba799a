// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Configuration for the Wave AI assistant: typing cadence, thinking pause,
//! persona and framing, network backend, and where state is stored.
mod loader;
mod schema;

pub use loader::{load, BACKEND_URL_ENV};
pub use schema::{
    BotConfig, ChatMode, Config, FramingConfig, Granularity, Persona, ResponderConfig, StoreConfig,
    StreamingConfig, ThinkingConfig,
};
