// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Responders for tests and offline runs.
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, bail};
use async_trait::async_trait;

use crate::{Responder, ResponderRequest};

/// Always answers with the same text.
#[derive(Debug, Clone)]
pub struct StaticResponder {
    reply: String,
}

impl StaticResponder {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

#[async_trait]
impl Responder for StaticResponder {
    fn name(&self) -> &str {
        "static"
    }

    async fn respond(&self, _request: ResponderRequest) -> anyhow::Result<String> {
        Ok(self.reply.clone())
    }
}

/// Fails every call, like an unreachable backend.
#[derive(Debug, Clone)]
pub struct FailingResponder {
    message: String,
}

impl FailingResponder {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl Default for FailingResponder {
    fn default() -> Self {
        Self::new("backend unreachable")
    }
}

#[async_trait]
impl Responder for FailingResponder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn respond(&self, _request: ResponderRequest) -> anyhow::Result<String> {
        bail!("{}", self.message)
    }
}

/// Never answers.  Only a caller-side timeout or cancellation ends the call.
#[derive(Debug, Clone, Default)]
pub struct StalledResponder;

#[async_trait]
impl Responder for StalledResponder {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn respond(&self, _request: ResponderRequest) -> anyhow::Result<String> {
        std::future::pending::<()>().await;
        bail!("stalled responder woke up")
    }
}

/// Pops one scripted outcome per call and records every request.  An
/// exhausted script fails.
pub struct ScriptedResponder {
    script: Mutex<VecDeque<Result<String, String>>>,
    seen: Mutex<Vec<ResponderRequest>>,
}

impl ScriptedResponder {
    /// `Ok(text)` answers, `Err(message)` fails.
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: answers once with `reply`.
    pub fn once(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ResponderRequest> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn respond(&self, request: ResponderRequest) -> anyhow::Result<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("script exhausted"),
        }
    }
}
