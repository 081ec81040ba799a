// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Problems found while loading a knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("could not read knowledge base '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("invalid knowledge base YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("rule '{rule}' references unknown topic '{topic}'")]
    UnknownTopic { rule: String, topic: String },

    #[error("rule '{rule}' uses unknown placeholder filter '{filter}'")]
    UnknownFilter { rule: String, filter: String },

    #[error("rule '{0}' has no keywords")]
    EmptyKeywords(String),

    #[error("knowledge base has an empty default response")]
    EmptyDefault,

    #[error("invalid humanization phrase '{0}': {1}")]
    InvalidPhrase(String, #[source] regex::Error),
}

/// Failures of the key-value persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access store file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("store file '{0}' is not a JSON object: {1}")]
    Corrupt(String, #[source] serde_json::Error),

    #[error("stored value '{0}' is malformed: {1}")]
    InvalidValue(String, #[source] serde_json::Error),

    #[error("could not serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
}
