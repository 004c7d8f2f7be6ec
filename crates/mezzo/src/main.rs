//! Chat with the Mezzo persona from the terminal.
//!
//! Reads the API key from the `OPENAI_API_KEY` environment variable, loads
//! `README.md` and `sops/knowledge_base.md` from the root directory, and
//! starts an interactive session. Type `quit` or `exit` (or press Ctrl-C)
//! to leave.
//!
//! # Examples
//!
//! ```sh
//! # Run from the repository that holds README.md and sops/
//! mezzo
//!
//! # Point at another checkout and try a different model
//! mezzo --root ../mezzo-receptionist --model gpt-4o-mini
//!
//! # Retry rate limits and 5xx twice, with debug logs on stderr
//! mezzo --retries 2 -vv
//! ```

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use mezzo::config::ChatConfig;
use mezzo::context::{ContextPaths, load_session_context};
use mezzo::input::{InputSource, StdinInput, TerminalInput};
use mezzo::prompt::compose_system_message;
use mezzo::session::{ChatSession, USER_PROMPT, banner};
use mezzo::{ChatError, OpenAiClient, logging};
use tracing::{info, warn};

/// Chat with the Mezzo persona from the terminal.
///
/// Reads the API key from the OPENAI_API_KEY environment variable.
#[derive(Parser)]
#[command(name = "mezzo", version)]
struct Cli {
    /// Directory containing README.md and sops/knowledge_base.md
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Model to chat with (default: $CHAT_MODEL or gpt-4o)
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature (0.0 = deterministic, 2.0 = very creative)
    #[arg(long, default_value_t = mezzo::DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// API base URL (default: $OPENAI_BASE_URL or https://api.openai.com/v1)
    #[arg(long)]
    base_url: Option<String>,

    /// Retries for rate limits, 5xx responses, and network errors
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Give up on a reply after this many seconds (default: wait forever)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Resolve configuration and build the system message.
///
/// The credential is checked before any file is read.
fn prepare(cli: &Cli) -> Result<(ChatConfig, String), ChatError> {
    let mut config = ChatConfig::from_env()?
        .with_root(&cli.root)
        .with_temperature(cli.temperature)
        .with_retries(cli.retries);
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config.validate()?;
    info!(?config, "Configuration loaded");

    let context = load_session_context(&ContextPaths::under(&config.root))?;
    let system = compose_system_message(&context.persona, &context.knowledge_base);
    Ok((config, system))
}

fn report_startup_error(e: &ChatError) {
    match e {
        ChatError::MissingApiKey { .. } => {
            println!("Error: {e}.");
            println!("Please set it before running this script.");
        }
        ChatError::MissingContext { .. } | ChatError::EmptyContext { .. } => {
            println!("Error: {e}");
            println!("Critical files missing. Check directories.");
        }
        _ => println!("Error: {e}"),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialise logging: {e}");
    }

    let (config, system) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            report_startup_error(&e);
            process::exit(1);
        }
    };

    let client = match OpenAiClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            report_startup_error(&e);
            process::exit(1);
        }
    };

    println!("{}", banner());

    let failed = if std::io::stdin().is_terminal() {
        match TerminalInput::new(USER_PROMPT) {
            Ok((input, out)) => converse(&client, input, out, &config, system).await,
            Err(e) => {
                warn!("Line editor unavailable, reading plain stdin: {e}");
                converse(&client, StdinInput::new(), std::io::stdout(), &config, system).await
            }
        }
    } else {
        converse(&client, StdinInput::new(), std::io::stdout(), &config, system).await
    };

    // A console read may still be parked on a blocking thread; exiting here
    // keeps runtime shutdown from waiting on it.
    let _ = std::io::stdout().flush();
    process::exit(if failed { 1 } else { 0 });
}

/// Run one session to completion. Returns `true` if it failed.
///
/// The session, and with it the input source, is dropped before returning
/// so the terminal leaves raw mode.
async fn converse<I, W>(
    client: &OpenAiClient,
    input: I,
    out: W,
    config: &ChatConfig,
    system: String,
) -> bool
where
    I: InputSource,
    W: Write,
{
    let mut session = ChatSession::new(client, input, out, config, system);
    session.run().await.is_failure()
}
