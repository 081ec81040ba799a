// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("invalid streaming options: min delay {min:?} exceeds max delay {max:?}")]
    InvalidOptions { min: Duration, max: Duration },

    #[error("invalid thinking range: {min:?} exceeds {max:?}")]
    InvalidThinkingRange { min: Duration, max: Duration },
}
