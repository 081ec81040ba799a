// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wave_config::ChatMode;
use wave_stream::{CancellationToken, StreamError, StreamOutcome};

use crate::{Bot, ConversationHistory, KeyValueStore, Message, StoreError};

/// Store key holding a saved conversation.
pub const CONVERSATION_KEY: &str = "conversation";

#[derive(Serialize, Deserialize)]
struct Saved {
    mode: ChatMode,
    messages: ConversationHistory,
}

/// A chat session: the bot, its message history, and the current mode.
pub struct Conversation {
    bot: Arc<Bot>,
    history: ConversationHistory,
    mode: ChatMode,
}

impl Conversation {
    pub fn new(bot: Arc<Bot>) -> Self {
        let mode = bot.mode();
        Self { bot, history: ConversationHistory::new(), mode }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Change mode.  A different mode starts a fresh history.
    pub fn switch_mode(&mut self, mode: ChatMode) {
        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "switching chat mode");
            self.mode = mode;
            self.history.clear();
        }
    }

    /// Send `text` and stream the answer into a new assistant message.
    ///
    /// `on_update` sees the assistant message after every chunk, with the
    /// chunk's completion flag.  Returns the assistant message and how the
    /// stream ended; a cancelled answer keeps whatever was revealed.
    pub async fn submit<F>(
        &mut self,
        text: &str,
        mut on_update: F,
        cancel: &CancellationToken,
    ) -> Result<(Message, StreamOutcome), StreamError>
    where
        F: FnMut(&Message, bool),
    {
        let prior = self.history.messages().to_vec();
        self.history.push(Message::user(text));
        let id = self.history.push(Message::assistant(""));

        let history = &mut self.history;
        let outcome = self
            .bot
            .generate_streaming_response(
                text,
                &prior,
                self.mode,
                |chunk, done| {
                    if history.apply_chunk(&id, chunk) {
                        if let Some(m) = history.get(&id) {
                            on_update(m, done);
                        }
                    }
                },
                cancel,
            )
            .await?;

        let message = self
            .history
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Message::assistant(outcome.text()));
        debug!(completed = outcome.is_completed(), chars = message.content.chars().count(), "turn finished");
        Ok((message, outcome))
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let saved = Saved { mode: self.mode, messages: self.history.clone() };
        store.set(CONVERSATION_KEY, &serde_json::to_string(&saved)?)
    }

    /// Replace mode and history with the saved ones.  Returns `false` when
    /// nothing was saved.
    pub fn restore(&mut self, store: &dyn KeyValueStore) -> Result<bool, StoreError> {
        let Some(raw) = store.get(CONVERSATION_KEY)? else {
            return Ok(false);
        };
        let saved: Saved =
            serde_json::from_str(&raw).map_err(|e| StoreError::InvalidValue(CONVERSATION_KEY.into(), e))?;
        self.mode = saved.mode;
        self.history = saved.messages;
        debug!(messages = self.history.len(), mode = %self.mode, "conversation restored");
        Ok(true)
    }
}
