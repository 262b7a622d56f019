//! socra - Socratic tutor chat in the terminal

mod commands;
mod config;
mod session;
mod ui;

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use socra_ai::providers::huggingface::HuggingFaceProvider;
use socra_ai::stream::is_error_element;
use socra_ai::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_CREDENTIAL_ENV_VAR, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_MODEL_ID, Model, PromptFormatter, ResponseStreamer,
};
use tracing_subscriber::EnvFilter;

use crate::commands::CommandResult;
use crate::session::ChatSession;
use crate::ui::{PartialRenderer, Rendered};

/// socra - a tutor that answers with questions
#[derive(Parser, Debug)]
#[command(name = "socra")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: mistralai/Mixtral-8x7B-Instruct-v0.1)
    #[arg(short, long)]
    model: Option<String>,

    /// Inference service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum number of tokens to generate
    #[arg(long)]
    max_new_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Nucleus-sampling probability mass
    #[arg(long)]
    top_p: Option<f32>,

    /// Penalty applied to repeated tokens
    #[arg(long)]
    repetition_penalty: Option<f32>,

    /// Use greedy decoding instead of sampling
    #[arg(long)]
    greedy: bool,

    /// File containing a custom system prompt
    #[arg(long)]
    system_prompt_file: Option<String>,

    /// Seconds to wait for the next streamed token
    #[arg(long)]
    timeout: Option<u64>,

    /// Ask a single question and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never mix with the streamed answer
    let filter = if args.verbose {
        EnvFilter::new("socra=debug,socra_ai=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if args.init_config {
        let path = config::Config::init()?;
        println!("Config file at: {}", path.display());
        return Ok(());
    }

    let mut cfg = config::Config::load();
    if args.system_prompt_file.is_some() {
        cfg.system_prompt_file = args.system_prompt_file.clone();
    }

    let client_config = build_client_config(&args, &cfg);
    tracing::debug!(
        model = %client_config.model.id,
        base_url = %client_config.model.base_url,
        has_credential = client_config.credential().is_some(),
        "resolved configuration"
    );

    let formatter = match cfg.system_prompt()? {
        Some(prompt) => PromptFormatter::new(prompt.trim_end()),
        None => PromptFormatter::default(),
    };

    let provider = Arc::new(HuggingFaceProvider::new()?);
    let streamer = ResponseStreamer::new(provider, &client_config);

    if let Some(command) = args.command {
        let mut session = ChatSession::new();
        let rendered = ask(&streamer, &formatter, &mut session, &command).await?;
        return one_shot_outcome(&rendered);
    }

    run_interactive(&streamer, &formatter, &client_config).await
}

/// Merge config with CLI args (CLI takes precedence)
fn build_client_config(args: &Args, cfg: &config::Config) -> ClientConfig {
    let model_id = args
        .model
        .clone()
        .or(cfg.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
    let base_url = args
        .base_url
        .clone()
        .or(cfg.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let credential_env_var = cfg
        .credential_env_var
        .clone()
        .unwrap_or_else(|| DEFAULT_CREDENTIAL_ENV_VAR.to_string());

    let mut generation = cfg.generation.clone().unwrap_or_default();
    if let Some(max_new_tokens) = args.max_new_tokens {
        generation.max_new_tokens = max_new_tokens;
    }
    if let Some(temperature) = args.temperature {
        generation.temperature = temperature;
    }
    if let Some(top_p) = args.top_p {
        generation.top_p = top_p;
    }
    if let Some(repetition_penalty) = args.repetition_penalty {
        generation.repetition_penalty = repetition_penalty;
    }
    if args.greedy {
        generation.do_sample = false;
    }

    let idle_timeout = args
        .timeout
        .or(cfg.idle_timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_IDLE_TIMEOUT);

    ClientConfig {
        model: Model::new(model_id, base_url),
        credential: cfg.credential(&credential_env_var),
        credential_env_var,
        generation,
        idle_timeout,
    }
}

/// Send one message and render the answer on stdout
async fn ask(
    streamer: &ResponseStreamer,
    formatter: &PromptFormatter,
    session: &mut ChatSession,
    message: &str,
) -> anyhow::Result<Rendered> {
    let mut renderer = PartialRenderer::new(io::stdout());
    let rendered = ask_with(
        streamer,
        formatter,
        session,
        message,
        &mut renderer,
        tokio::signal::ctrl_c(),
    )
    .await?;

    if rendered.interrupted {
        println!("[stopped]");
    }
    Ok(rendered)
}

/// Stream one answer; only completed answers join the history
async fn ask_with<W: Write, F: Future>(
    streamer: &ResponseStreamer,
    formatter: &PromptFormatter,
    session: &mut ChatSession,
    message: &str,
    renderer: &mut PartialRenderer<W>,
    interrupt: F,
) -> io::Result<Rendered> {
    let prompt = formatter.format(session.history(), message);
    tracing::debug!(history_turns = session.len(), "sending message");
    session.begin(message);

    let partials = streamer.stream(prompt);
    let rendered = ui::render_stream(partials, renderer, interrupt).await?;

    if rendered.interrupted {
        tracing::debug!("answer interrupted by user");
    } else if !is_error_element(&rendered.text) {
        session.record(message, rendered.text.clone());
    }

    Ok(rendered)
}

/// One-shot runs fail when the answer was an error report or was cut short
fn one_shot_outcome(rendered: &Rendered) -> anyhow::Result<()> {
    if is_error_element(&rendered.text) {
        anyhow::bail!("generation failed");
    }
    if rendered.interrupted {
        anyhow::bail!("generation interrupted");
    }
    Ok(())
}

async fn run_interactive(
    streamer: &ResponseStreamer,
    formatter: &PromptFormatter,
    client_config: &ClientConfig,
) -> anyhow::Result<()> {
    let mut session = ChatSession::new();

    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let model_short = client_config
            .model
            .id
            .split('/')
            .next_back()
            .unwrap_or(&client_config.model.id);
        eprintln!("socra ({}) - type /help for commands", model_short);
        eprintln!();
    }

    let mut lines = ui::spawn_line_reader();

    loop {
        print!("> ");
        io::stdout().flush()?;

        // EOF or Ctrl-C at the prompt
        let Some(input) = ui::next_line(&mut lines, tokio::signal::ctrl_c()).await else {
            println!();
            break;
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let message = match commands::execute_command(input, &session) {
            None => input.to_string(),
            Some(CommandResult::Send(message)) => {
                println!("> {}", message);
                message
            }
            Some(CommandResult::Retry) => match session.retry() {
                Some(message) => {
                    println!("> {}", message);
                    message
                }
                None => {
                    println!("Nothing to retry.");
                    continue;
                }
            },
            Some(CommandResult::Undo) => {
                match session.undo() {
                    Some(turn) => println!("Removed: {}", turn.user),
                    None => println!("Nothing to undo."),
                }
                continue;
            }
            Some(CommandResult::Clear) => {
                session.clear();
                println!("Cleared conversation.");
                continue;
            }
            Some(CommandResult::Message(msg)) => {
                println!("{}", msg);
                continue;
            }
            Some(CommandResult::Unknown(cmd)) => {
                println!("Unknown command: /{}", cmd);
                println!("Type /help for available commands.");
                continue;
            }
            Some(CommandResult::Exit) => break,
        };

        ask(streamer, formatter, &mut session, &message).await?;
        println!();
    }

    Ok(())
}
