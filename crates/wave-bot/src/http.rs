// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use wave_config::{ChatMode, ResponderConfig};

use crate::{Responder, ResponderRequest};

/// Responder backed by the Wave AI HTTP backend.
///
/// Every request is a JSON `POST`.  A non-2xx status, a body that is not
/// JSON, or a body without the expected field is an error.
#[derive(Debug, Clone)]
pub struct HttpResponder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResponder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &ResponderConfig) -> anyhow::Result<Self> {
        Self::new(cfg.base_url.clone(), Duration::from_secs(cfg.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, endpoint: &str, body: &Value) -> anyhow::Result<Value> {
        let url = format!("{}{endpoint}", self.base_url);
        let started = Instant::now();

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?;

        let status = resp.status();
        debug!(endpoint, %status, elapsed_ms = started.elapsed().as_millis() as u64, "backend replied");
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("{endpoint} error {status}: {text}");
        }

        resp.json::<Value>()
            .await
            .with_context(|| format!("{endpoint} returned malformed JSON"))
    }
}

#[async_trait]
impl Responder for HttpResponder {
    fn name(&self) -> &str {
        "http"
    }

    async fn respond(&self, request: ResponderRequest) -> anyhow::Result<String> {
        let endpoint = request.endpoint();
        match request {
            ResponderRequest::Chat { message, mode, history } => {
                let body = json!({
                    "message": message,
                    "mode": mode,
                    "use_rag": true,
                    "history": history,
                });
                chat_text(&self.post(endpoint, &body).await?, mode)
            }
            ResponderRequest::EnhanceIdea { idea } => {
                let v = self.post(endpoint, &json!({ "idea": idea })).await?;
                required_str(&v, "enhanced_idea")
            }
            ResponderRequest::RethinkIdea { idea, current } => {
                let body = json!({
                    "idea": idea,
                    "variation": chrono::Utc::now().timestamp_millis(),
                    "count": 3,
                });
                rethought_text(&self.post(endpoint, &body).await?, current.as_deref())
            }
            ResponderRequest::ExplainMutation { original, mutated } => {
                let body = json!({ "original_idea": original, "mutated_idea": mutated });
                required_str(&self.post(endpoint, &body).await?, "explanation")
            }
            ResponderRequest::ValidateIdea { idea } => {
                validation_report(&self.post(endpoint, &json!({ "idea": idea })).await?)
            }
        }
    }
}

// ─── Response extraction ─────────────────────────────────────────────────────

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn required_str(v: &Value, field: &str) -> anyhow::Result<String> {
    v.get(field)
        .and_then(Value::as_str)
        .and_then(non_empty)
        .with_context(|| format!("response has no '{field}' text"))
}

/// Text of a chat `response` field: a string, or an envelope carrying
/// `guidance` (plus optional `follow_up`), `response`, or `content`.
fn envelope_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => non_empty(s),
        Value::Object(o) => {
            if let Some(guidance) = o.get("guidance").and_then(Value::as_str).and_then(non_empty) {
                return Some(match o.get("follow_up").and_then(Value::as_str).and_then(non_empty) {
                    Some(follow_up) => format!("{guidance}\n\n{follow_up}"),
                    None => guidance,
                });
            }
            o.get("response")
                .and_then(envelope_text)
                .or_else(|| o.get("content").and_then(envelope_text))
        }
        _ => None,
    }
}

/// `choices[0].message.content` of a chat-completion body.
fn completion_text(v: &Value) -> Option<String> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .and_then(non_empty)
}

pub(crate) fn chat_text(v: &Value, mode: ChatMode) -> anyhow::Result<String> {
    if mode == ChatMode::Idea {
        if let Some(analysis) = v.get("analysis").and_then(Value::as_str).and_then(non_empty) {
            return Ok(analysis);
        }
    }
    v.get("response")
        .and_then(envelope_text)
        .or_else(|| completion_text(v))
        .context("chat response has no usable text")
}

/// First candidate that differs from `current`, else the first candidate.
/// A lone candidate equal to `current` is an error.
pub(crate) fn rethought_text(v: &Value, current: Option<&str>) -> anyhow::Result<String> {
    let candidates: Vec<String> = match v.get("rethought_ideas").or_else(|| v.get("mutations")) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).filter_map(non_empty).collect(),
        _ => v
            .get("rethought_idea")
            .and_then(Value::as_str)
            .and_then(non_empty)
            .into_iter()
            .collect(),
    };

    let current = current.map(str::trim).filter(|c| !c.is_empty());
    let chosen = candidates
        .iter()
        .find(|c| Some(c.as_str()) != current)
        .or_else(|| candidates.first())
        .context("rethink response has no ideas")?;

    if Some(chosen.as_str()) == current {
        bail!("rethink response only repeats the current idea");
    }
    Ok(chosen.clone())
}

fn score(v: &Value, field: &str) -> i64 {
    v.get(field).and_then(Value::as_f64).map_or(0, |s| s.round() as i64)
}

/// Human-readable summary of a `/api/validate-idea` reply.
pub(crate) fn validation_report(v: &Value) -> anyhow::Result<String> {
    if v.get("success").and_then(Value::as_bool) != Some(true) {
        let reason = v.get("error").and_then(Value::as_str).unwrap_or("no reason given");
        bail!("validation failed: {reason}");
    }
    let r = v
        .get("validation_result")
        .filter(|r| r.is_object())
        .context("response has no 'validation_result'")?;

    let overall = score(r, "validation_score");
    let market = score(r, "market_score");
    let tech = score(r, "tech_score");
    let competition = score(r, "competition_score");
    let confidence = r.get("confidence_level").and_then(Value::as_str).unwrap_or("Medium");

    let verdict = match overall {
        s if s >= 80 => "This idea shows exceptional potential.",
        60..=79 => "This idea demonstrates good potential; strategic improvements could make it a successful venture.",
        40..=59 => "This idea shows some potential but requires significant refinement before proceeding.",
        _ => "This idea faces significant challenges and needs substantial rethinking or pivoting.",
    };

    Ok(format!(
        "Validation score: {overall}% ({confidence} confidence)\n\
         Market potential: {market}%\n\
         Technical feasibility: {tech}%\n\
         Competition: {competition}%\n\n\
         {verdict}"
    ))
}
