// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Keyword-routed response engine for the Wave AI assistants.
//!
//! A [`Bot`] maps a user utterance to response text: either a canned answer
//! picked from a [`KnowledgeBase`] by literal keyword matching, or the reply
//! of a network [`Responder`] with the canned answer as fallback.  The text
//! is humanized, optionally framed with a conversational starter or
//! connector, and revealed through the typing simulator from `wave-stream`.
//!
//! [`IdeaWorkshop`] drives the idea-mutation flows (enhance, rethink,
//! explain, validate) with the same network-then-template resilience, and
//! [`Conversation`] ties a bot to a message history and a
//! [`KeyValueStore`].
mod bot;
mod conversation;
mod error;
mod fallback;
mod http;
mod humanize;
mod knowledge;
mod message;
pub mod mock;
mod responder;
mod store;
mod workshop;

pub use bot::{Bot, BotBuilder, BotState, PersonaProfile};
pub use conversation::{Conversation, CONVERSATION_KEY};
pub use error::{KnowledgeError, StoreError};
pub use fallback::{explanation_fallback, mutation_fallback, validation_fallback, MUTATION_TEMPLATE_COUNT};
pub use http::HttpResponder;
pub use humanize::{Framing, FramingDecision, Humanizer, Style, Substitution};
pub use knowledge::{FollowUps, KnowledgeBase, Rule};
pub use message::{ConversationHistory, Message, Role};
pub use responder::{HistoryTurn, Responder, ResponderRequest};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use workshop::{IdeaWorkshop, IDEA_TEXT_KEY, MUTATED_IDEA_KEY};
