//! Patchwire — conversation stream reassembly
//!
//! Reads a raw event stream captured from the conversation backend (file or stdin),
//! merges it, and prints the reply. `ingest` also records the continuation ids in the
//! session file so the next request continues the same conversation.

use clap::Parser;
use patchwire::config::{self, Session};
use patchwire::request::NextMessage;
use patchwire::stream;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "patchwire", about = "Conversation stream reassembly")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Session file to use instead of the one in the config directory
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the merged stream
    Merge {
        /// Raw stream file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },
    /// Print the reply text
    Reply {
        /// Raw stream file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },
    /// Print the conversation id and last assistant message id
    Ids {
        /// Raw stream file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },
    /// Reassemble a stream, store its continuation ids and print the reply
    Ingest {
        /// Raw stream file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },
    /// Print the JSON body of the next request
    Request {
        /// The user message to send
        message: String,
    },
    /// Forget the current conversation
    Reset,
    /// Drop the stored cookie so the login flow runs again
    ClearCookie,
    /// Print the stored session with secrets redacted
    Show,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PATCHWIRE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(input: Option<&Path>) -> patchwire::Result<String> {
    match input {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn session_path(cli_path: Option<PathBuf>) -> patchwire::Result<PathBuf> {
    match cli_path {
        Some(p) => Ok(p),
        None => config::default_session_path(),
    }
}

fn update_session(path: &Path, f: impl FnOnce(&mut Session)) -> patchwire::Result<()> {
    let mut session = config::load_session(path)?;
    f(&mut session);
    config::save_session(&session, path)
}

fn run(cli: Cli) -> patchwire::Result<()> {
    match cli.command {
        Command::Merge { input } => {
            let raw = read_input(input.as_deref())?;
            print!("{}", stream::merge(&raw));
        }
        Command::Reply { input } => {
            let raw = read_input(input.as_deref())?;
            println!("{}", stream::extract_reply(&stream::merge(&raw)));
        }
        Command::Ids { input } => {
            let raw = read_input(input.as_deref())?;
            let state = stream::extract_conversation(&stream::merge(&raw));
            println!("conversation_id: {}", state.conversation_id);
            println!("message_id: {}", state.last_assistant_message_id);
        }
        Command::Ingest { input } => {
            let path = session_path(cli.config)?;
            let raw = read_input(input.as_deref())?;
            let reassembly = stream::reassemble(&raw);

            let mut session = config::load_session(&path)?;
            if !session.has_credentials() {
                warn!("session at {} has no user token", path.display());
            }
            if session.apply(&reassembly) {
                config::save_session(&session, &path)?;
                info!(
                    conversation_id = %session.conversation_id,
                    parent_message_id = %session.parent_message_id,
                    "session updated"
                );
            }
            if reassembly.reply.is_empty() {
                warn!("stream carried no reply text");
            }
            println!("{}", reassembly.reply);
        }
        Command::Request { message } => {
            let path = session_path(cli.config)?;
            let session = config::load_session(&path)?;
            let body = NextMessage::from_session(&session, &message);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Reset => {
            let path = session_path(cli.config)?;
            update_session(&path, Session::reset)?;
            println!("Started a new conversation");
        }
        Command::ClearCookie => {
            let path = session_path(cli.config)?;
            update_session(&path, Session::clear_cookie)?;
            println!("Cookie cleared");
        }
        Command::Show => {
            let path = session_path(cli.config)?;
            let session = config::load_session(&path)?;
            println!("{}", serde_json::to_string_pretty(&session.redacted())?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("patchwire: {e}");
            ExitCode::FAILURE
        }
    }
}
