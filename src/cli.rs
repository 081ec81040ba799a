// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use wave_config::{ChatMode, Config, Granularity, Persona};

#[derive(Parser, Debug)]
#[command(
    name = "wave",
    about = "Talk to the Wave AI assistant and work on business ideas from the terminal",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Knowledge base and typing profile to use
    #[arg(long, short = 'p', value_enum, global = true)]
    pub persona: Option<Persona>,

    /// Backend base URL; turns on network answers
    #[arg(long, global = true, value_name = "URL", conflicts_with = "offline")]
    pub backend: Option<String>,

    /// Never contact the backend, even if the config enables it
    #[arg(long, global = true)]
    pub offline: bool,

    /// Chat mode forwarded to the backend
    #[arg(long, short = 'm', value_enum, global = true)]
    pub mode: Option<ChatMode>,

    /// Reveal answers word by word or character by character
    #[arg(long, value_enum, global = true)]
    pub granularity: Option<Granularity>,

    /// Fixed RNG seed for reproducible framing and typing jitter
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask one question and stream the answer
    Ask {
        #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Interactive chat; `/mode chat|idea` switches mode, `/quit` leaves
    Chat {
        /// Start from an empty conversation instead of the saved one
        #[arg(long)]
        fresh: bool,
    },
    /// Mutate an idea and save the result for building
    Mutate {
        /// New idea text; defaults to the stored idea
        #[arg(value_name = "IDEA")]
        idea: Option<String>,
    },
    /// Replace the saved mutation with a different one
    Rethink,
    /// Explain how the saved mutation differs from the idea
    Explain,
    /// Score an idea's viability
    Validate {
        /// Idea text; defaults to the stored idea
        #[arg(value_name = "IDEA")]
        idea: Option<String>,
    },
    /// Print the merged configuration
    ShowConfig,
    /// Print shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Fold command-line overrides into the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(persona) = self.persona {
            config.bot.persona = persona;
        }
        if let Some(url) = &self.backend {
            config.responder.enabled = true;
            config.responder.base_url = url.clone();
        }
        if self.offline {
            config.responder.enabled = false;
        }
        if let Some(mode) = self.mode {
            config.responder.chat_mode = mode;
        }
        if let Some(granularity) = self.granularity {
            config.streaming.granularity = granularity;
        }
        if self.seed.is_some() {
            config.bot.seed = self.seed;
        }
    }
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "wave", &mut std::io::stdout());
}
