// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use rand::Rng;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use wave_config::FramingConfig;

use crate::KnowledgeError;

/// One literal phrase rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    fn new(from: &str, to: &str) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

fn default_substitutions() -> Vec<Substitution> {
    vec![
        Substitution::new("I can", "I can definitely"),
        Substitution::new("You can", "You can absolutely"),
        Substitution::new("This is", "This is exactly"),
        Substitution::new("We have", "We've got"),
        Substitution::new("It is", "It's"),
        Substitution::new("That is", "That's"),
        Substitution::new("We are", "We're"),
        Substitution::new("You are", "You're"),
    ]
}

fn default_starters() -> Vec<String> {
    [
        "Great question! ",
        "Absolutely! ",
        "I'd love to explain that! ",
        "That's a fantastic question! ",
        "Perfect timing for that question! ",
        "I'm excited to share this with you! ",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_connectors() -> Vec<String> {
    [
        "Here's the thing - ",
        "What makes this special is ",
        "The cool part is ",
        "What's really exciting is ",
        "Here's what's amazing - ",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Surface style of a knowledge base: phrase rewrites plus the starter and
/// connector pools used by [`Framing`].  Every field falls back to the
/// built-in list when omitted from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default = "default_substitutions")]
    pub substitutions: Vec<Substitution>,
    #[serde(default = "default_starters")]
    pub starters: Vec<String>,
    #[serde(default = "default_connectors")]
    pub connectors: Vec<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            substitutions: default_substitutions(),
            starters: default_starters(),
            connectors: default_connectors(),
        }
    }
}

// ─── Humanizer ───────────────────────────────────────────────────────────────

/// Applies [`Substitution`]s in order, globally, on word boundaries.
#[derive(Debug, Clone)]
pub struct Humanizer {
    rules: Vec<(Regex, String)>,
}

impl Humanizer {
    pub fn new(substitutions: &[Substitution]) -> Result<Self, KnowledgeError> {
        let rules = substitutions
            .iter()
            .map(|s| {
                let pattern = format!(r"\b{}\b", regex::escape(&s.from));
                Regex::new(&pattern)
                    .map(|re| (re, s.to.clone()))
                    .map_err(|e| KnowledgeError::InvalidPhrase(s.from.clone(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (re, to) in &self.rules {
            if re.is_match(&out) {
                out = re.replace_all(&out, NoExpand(to)).into_owned();
            }
        }
        out
    }
}

// ─── Framing ─────────────────────────────────────────────────────────────────

/// The random part of framing, drawn once per response.  Indices point into
/// the starter and connector pools of the [`Framing`] that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramingDecision {
    pub starter: Option<usize>,
    pub connector: Option<usize>,
}

impl FramingDecision {
    /// Leave the text untouched.
    pub const NONE: Self = Self { starter: None, connector: None };
}

/// Randomized conversational prefix and mid-text connector.
#[derive(Debug, Clone)]
pub struct Framing {
    starters: Vec<String>,
    connectors: Vec<String>,
    starter_probability: f64,
    connector_probability: f64,
    connector_min_chars: usize,
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

impl Framing {
    pub fn new(style: &Style, cfg: &FramingConfig) -> Self {
        Self {
            starters: style.starters.clone(),
            connectors: style.connectors.clone(),
            starter_probability: probability(cfg.starter_probability),
            connector_probability: probability(cfg.connector_probability),
            connector_min_chars: cfg.connector_min_chars,
        }
    }

    /// Framing that never fires.
    pub fn disabled(style: &Style) -> Self {
        Self::new(
            style,
            &FramingConfig {
                starter_probability: 0.0,
                connector_probability: 0.0,
                ..FramingConfig::default()
            },
        )
    }

    /// Draw the random choices for `text`.
    ///
    /// The connector is only considered when the text, including a chosen
    /// starter, is longer than `connector_min_chars` characters.
    pub fn decide<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> FramingDecision {
        let mut len = text.chars().count();

        let starter = if !self.starters.is_empty() && rng.gen_bool(self.starter_probability) {
            let i = rng.gen_range(0..self.starters.len());
            len += self.starters[i].chars().count();
            Some(i)
        } else {
            None
        };

        let connector = if len > self.connector_min_chars
            && !self.connectors.is_empty()
            && rng.gen_bool(self.connector_probability)
        {
            Some(rng.gen_range(0..self.connectors.len()))
        } else {
            None
        };

        FramingDecision { starter, connector }
    }

    /// Apply a decision.  Pure: the same text and decision always give the
    /// same output.  Out-of-range indices are ignored.
    pub fn apply(&self, text: &str, decision: FramingDecision) -> String {
        let mut out = match decision.starter.and_then(|i| self.starters.get(i)) {
            Some(starter) => format!("{starter}{text}"),
            None => text.to_string(),
        };

        if let Some(connector) = decision.connector.and_then(|i| self.connectors.get(i)) {
            let mut sentences: Vec<String> = out.split(". ").map(String::from).collect();
            if sentences.len() > 2 {
                let mid = sentences.len() / 2;
                sentences[mid] = format!("{connector}{}", lowercase_leading_letters(&sentences[mid]));
                out = sentences.join(". ");
            }
        }
        out
    }

    /// [`decide`](Self::decide) then [`apply`](Self::apply).
    pub fn frame<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        let decision = self.decide(text, rng);
        self.apply(text, decision)
    }
}

/// Lowercase the run of letters at the start of `s`.
fn lowercase_leading_letters(s: &str) -> String {
    let split = s
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map_or(s.len(), |(i, _)| i);
    let (head, tail) = s.split_at(split);
    format!("{}{tail}", head.to_lowercase())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
