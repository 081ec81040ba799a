// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use wave_config::ChatMode;

use crate::{Message, Role};

/// One prior message forwarded with a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryTurn {
    fn from(m: &Message) -> Self {
        Self { role: m.role, content: m.content.clone() }
    }
}

/// What the assistant asks the backend for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderRequest {
    /// Free-form answer to a chat message.
    Chat {
        message: String,
        mode: ChatMode,
        history: Vec<HistoryTurn>,
    },
    /// AI-enhanced mutation of an idea.
    EnhanceIdea { idea: String },
    /// A different mutation than `current`.
    RethinkIdea { idea: String, current: Option<String> },
    /// Why `mutated` differs from `original`.
    ExplainMutation { original: String, mutated: String },
    /// Viability report for an idea.
    ValidateIdea { idea: String },
}

impl ResponderRequest {
    /// Backend path serving this request.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResponderRequest::Chat { .. } => "/api/chat",
            ResponderRequest::EnhanceIdea { .. } => "/api/ai-enhanced",
            ResponderRequest::RethinkIdea { .. } => "/api/rethink-idea",
            ResponderRequest::ExplainMutation { .. } => "/api/explain-mutation",
            ResponderRequest::ValidateIdea { .. } => "/api/validate-idea",
        }
    }
}

/// A network (or simulated) source of response text.
///
/// Implementations return the text or an error; they never fall back on
/// their own.  Callers decide what to show when a call fails.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn respond(&self, request: ResponderRequest) -> anyhow::Result<String>;
}

/// Call `responder` with `timeout` applied.  Failures, expiry, and blank
/// replies are logged and come back as `None`.
pub(crate) async fn call_with_timeout(
    responder: &dyn Responder,
    request: ResponderRequest,
    timeout: Duration,
) -> Option<String> {
    let endpoint = request.endpoint();
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, responder.respond(request)).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(text)) if !text.trim().is_empty() => {
            debug!(responder = responder.name(), endpoint, elapsed_ms, "responder answered");
            Some(text.trim().to_string())
        }
        Ok(Ok(_)) => {
            warn!(responder = responder.name(), endpoint, elapsed_ms, "responder returned blank text");
            None
        }
        Ok(Err(e)) => {
            warn!(responder = responder.name(), endpoint, elapsed_ms, error = %format!("{e:#}"), "responder failed");
            None
        }
        Err(_) => {
            warn!(responder = responder.name(), endpoint, ?timeout, "responder timed out");
            None
        }
    }
}
