mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use clap::Parser;
use cli::{Cli, Commands};
use wave_bot::{Bot, Conversation, FileStore, IdeaWorkshop, KeyValueStore, PersonaProfile, IDEA_TEXT_KEY};
use wave_config::{ChatMode, Config};
use wave_stream::{CancellationToken, StreamOutcome, StreamSimulator, StreamingOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Commands::Completions { shell } = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let mut config = wave_config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    match &cli.command {
        Commands::ShowConfig => {
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Ask { question } => ask(&config, &question.join(" ")).await,
        Commands::Chat { fresh } => chat(&config, *fresh).await,
        Commands::Mutate { idea } => mutate(&config, idea.as_deref()).await,
        Commands::Rethink => rethink(&config).await,
        Commands::Explain => explain(&config).await,
        Commands::Validate { idea } => validate(&config, idea.as_deref()).await,
        Commands::Completions { .. } => Ok(()),
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn ask(config: &Config, question: &str) -> anyhow::Result<()> {
    let bot = Bot::from_config(config)?;
    let interrupt = CtrlC::watch();
    let mut out = Typewriter::default();

    let outcome = bot
        .generate_streaming_response(question, &[], bot.mode(), |text, _| out.show(text), &interrupt.token)
        .await?;
    out.finish(&outcome);

    for suggestion in bot.follow_up_suggestions(question) {
        println!("  → {suggestion}");
    }
    Ok(())
}

async fn chat(config: &Config, fresh: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let bot = Arc::new(Bot::from_config(config)?);
    let mut conversation = Conversation::new(bot);

    if !fresh && conversation.restore(store.as_ref())? {
        info!(messages = conversation.history().len(), "resumed saved conversation");
        println!("(resumed {} messages, mode {})", conversation.history().len(), conversation.mode());
    }
    if let Some(greeting) = conversation.bot().encouraging_message() {
        println!("{greeting}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("[{}] > ", conversation.mode());
        let _ = io::stdout().flush();

        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.strip_prefix('/') {
            Some("quit" | "exit") => break,
            Some(cmd) if cmd.starts_with("mode") => {
                match cmd["mode".len()..].trim() {
                    "chat" => conversation.switch_mode(ChatMode::Chat),
                    "idea" => conversation.switch_mode(ChatMode::Idea),
                    other => println!("unknown mode '{other}' (use chat or idea)"),
                }
                continue;
            }
            Some(other) => {
                println!("unknown command '/{other}'");
                continue;
            }
            None => {}
        }

        let interrupt = CtrlC::watch();
        let mut out = Typewriter::default();
        let (_, outcome) = conversation
            .submit(input, |message, _| out.show(&message.content), &interrupt.token)
            .await?;
        out.finish(&outcome);

        if outcome.is_completed() {
            for suggestion in conversation.bot().follow_up_suggestions(input) {
                println!("  → {suggestion}");
            }
        }
        if let Err(e) = conversation.save(store.as_ref()) {
            warn!(error = %e, "could not save conversation");
        }
    }
    Ok(())
}

async fn mutate(config: &Config, idea: Option<&str>) -> anyhow::Result<()> {
    let mut workshop = workshop(config, idea)?;
    let mutated = workshop.enhance().await;
    workshop.build()?;
    type_out(config, &mutated).await
}

async fn rethink(config: &Config) -> anyhow::Result<()> {
    let mut workshop = workshop(config, None)?;
    workshop.load_mutation()?;
    let mutated = workshop.rethink().await;
    workshop.build()?;
    type_out(config, &mutated).await
}

async fn explain(config: &Config) -> anyhow::Result<()> {
    let mut workshop = workshop(config, None)?;
    if workshop.load_mutation()?.is_none() {
        bail!("no mutation saved; run `wave mutate` first");
    }
    let explanation = workshop.explain().await;
    type_out(config, &explanation).await
}

async fn validate(config: &Config, idea: Option<&str>) -> anyhow::Result<()> {
    let workshop = workshop(config, idea)?;
    let report = workshop.validate().await;
    type_out(config, &report).await
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let path = config.store.resolved_path();
    debug!(path = %path.display(), "opening store");
    Ok(Arc::new(FileStore::new(path)))
}

/// Workshop on the stored idea, or on `idea` after saving it.
fn workshop(config: &Config, idea: Option<&str>) -> anyhow::Result<IdeaWorkshop> {
    let store = open_store(config)?;
    if let Some(idea) = idea {
        store.set(IDEA_TEXT_KEY, idea.trim())?;
    }
    let mut workshop = IdeaWorkshop::from_config(config, store)?;
    if workshop.load_idea()?.filter(|i| !i.trim().is_empty()).is_none() {
        bail!("no idea stored; pass one with `wave mutate IDEA`");
    }
    Ok(workshop)
}

/// Type `text` to stdout with the configured cadence.
async fn type_out(config: &Config, text: &str) -> anyhow::Result<()> {
    let profile = PersonaProfile::for_persona(config.bot.persona);
    let options = StreamingOptions::from_config(&config.streaming, profile.typing_ms.0, profile.typing_ms.1);
    let mut simulator = StreamSimulator::new();
    if let Some(seed) = config.bot.seed {
        simulator = simulator.seeded(seed);
    }
    let interrupt = CtrlC::watch();
    let mut out = Typewriter::default();
    let outcome = simulator
        .stream_text(text, |chunk, _| out.show(chunk), &options, &interrupt.token)
        .await?;
    out.finish(&outcome);
    Ok(())
}

/// Cancels `token` on Ctrl-C until dropped.
struct CtrlC {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl CtrlC {
    fn watch() -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        Self { token, task }
    }
}

impl Drop for CtrlC {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Prints only the newly revealed tail of each chunk.
#[derive(Default)]
struct Typewriter {
    printed: usize,
}

impl Typewriter {
    fn show(&mut self, revealed: &str) {
        if let Some(tail) = revealed.get(self.printed..) {
            if !tail.is_empty() {
                let mut stdout = io::stdout().lock();
                let _ = stdout.write_all(tail.as_bytes());
                let _ = stdout.flush();
                self.printed = revealed.len();
            }
        }
    }

    fn finish(&self, outcome: &StreamOutcome) {
        println!();
        if !outcome.is_completed() {
            eprintln!("[interrupted]");
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
