//! # parley
//!
//! Command-line front end for the Parley synchronization core.
//!
//! Talks to the REST server configured by `PARLEY_BASE_URL` as the user
//! named by `PARLEY_USER_ID`, authenticating with `PARLEY_TOKEN`.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use parley_client::{ClientConfig, SyncEngine};
use parley_net::HttpRemoteStore;
use parley_shared::{
    ConversationKey, Credential, GroupId, Message, MessageId, SessionContext, UserId,
};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Read and write Parley conversations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List conversations, most recent first
    List,

    /// Print a conversation's messages
    Show {
        #[command(flatten)]
        target: Target,
    },

    /// Send a message
    Send {
        #[command(flatten)]
        target: Target,
        text: String,
    },

    /// Replace the text of one of your messages
    Edit {
        #[command(flatten)]
        target: Target,
        id: i64,
        text: String,
    },

    /// Delete one of your messages
    Delete {
        #[command(flatten)]
        target: Target,
        id: i64,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Private conversation with this user
    #[arg(long)]
    with: Option<i64>,

    /// Group conversation
    #[arg(long)]
    group: Option<i64>,
}

impl Target {
    fn key(&self, me: UserId) -> anyhow::Result<ConversationKey> {
        match (self.with, self.group) {
            (Some(peer), None) => Ok(ConversationKey::private(me, UserId(peer))),
            (None, Some(group)) => Ok(ConversationKey::group(GroupId(group))),
            _ => bail!("pass exactly one of --with or --group"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,parley_client=debug,parley_net=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Load configuration and session
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    debug!(?config, "Loaded configuration");
    let session = session_from_lookup(|key| std::env::var(key).ok())?;
    let me = session.user_id();
    info!(user = %me, base_url = %config.remote.base_url, "Starting Parley client v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 3. Wire the engine
    // -----------------------------------------------------------------------
    let remote = Arc::new(HttpRemoteStore::new(config.remote.clone())?);
    let engine = SyncEngine::new(session, remote, config);
    engine.load_conversations().await?;

    // -----------------------------------------------------------------------
    // 4. Run the command
    // -----------------------------------------------------------------------
    match cli.command {
        Commands::List => {
            for conversation in engine.conversations() {
                println!(
                    "{:<16} {:<24} {}",
                    conversation.key(me).to_string(),
                    conversation.title(),
                    conversation.preview_line()
                );
            }
        }
        Commands::Show { target } => {
            engine.open(target.key(me)?).await?;
            print_messages(&engine);
        }
        Commands::Send { target, text } => {
            engine.open(target.key(me)?).await?;
            let receipt = engine.send(&text).await?;
            match receipt.id {
                Some(id) => println!("sent as message {id}"),
                None => println!("sent"),
            }
        }
        Commands::Edit { target, id, text } => {
            engine.open(target.key(me)?).await?;
            engine.edit(MessageId(id), &text).await?;
            println!("edited message {id}");
        }
        Commands::Delete { target, id } => {
            engine.open(target.key(me)?).await?;
            engine.delete(MessageId(id)).await?;
            println!("deleted message {id}");
        }
    }

    Ok(())
}

fn session_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<SessionContext> {
    let raw = lookup("PARLEY_USER_ID").ok_or_else(|| anyhow!("PARLEY_USER_ID is not set"))?;
    let user_id = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("PARLEY_USER_ID is not a user id: {raw:?}"))?;
    let token = lookup("PARLEY_TOKEN").unwrap_or_default();
    Ok(SessionContext::new(UserId(user_id), Credential::new(token)))
}

fn print_messages(engine: &SyncEngine) {
    let me = engine.session().user_id();
    let peer = engine
        .active()
        .map(|room| room.conversation().title())
        .unwrap_or_default();
    for message in engine.messages() {
        println!(
            "[{}] {:>6} {}: {}{}",
            engine.format_display_time(&message),
            message.id.map(|id| id.to_string()).unwrap_or_default(),
            sender_label(&message, me, &peer),
            message.text,
            if message.edited { " (edited)" } else { "" }
        );
    }
}

fn sender_label(message: &Message, me: UserId, peer: &str) -> String {
    if message.sender_id == me {
        return "you".to_string();
    }
    match &message.sender_display_name {
        Some(name) => name.clone(),
        None if message.conversation_key.is_group() => message.sender_id.to_string(),
        None => peer.to_string(),
    }
}
