//! Chatsync CLI
//!
//! Terminal chat client built on the realtime store:
//! - Chat in a channel over WebSocket
//! - Generate a default config file

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chatsync::config::{generate_default_config, Config, LoggingConfig};
use chatsync::{ChatState, ConnectionState, RealtimeClientStore, WsTransport, LOCAL_USER_ID};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chatsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal chat client for real-time message servers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat in a channel
    Chat {
        /// Channel to open
        #[arg(short, long, default_value = "general")]
        channel: String,
        /// Server WebSocket URL (overrides config)
        #[arg(long)]
        url: Option<String>,
        /// Username stamped on outbound messages
        #[arg(short, long)]
        username: Option<String>,
        /// Display name stamped on outbound messages
        #[arg(short, long)]
        display_name: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Say(&'a str),
    Join(&'a str),
    Typing(bool),
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return Input::Say(line);
    };

    let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
    match (name, arg.trim()) {
        ("quit", _) | ("q", _) => Input::Quit,
        ("join", channel) if !channel.is_empty() => Input::Join(channel),
        ("typing", "on") => Input::Typing(true),
        ("typing", "off") => Input::Typing(false),
        _ => Input::Unknown(line),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Wrote default config to {}", path.display());
                }
                None => print!("{}", content),
            }
        }

        Commands::Chat {
            channel,
            url,
            username,
            display_name,
        } => {
            let mut config = match &cli.config {
                Some(path) => Config::load_with_env(path)?,
                None => Config::load_default(),
            };
            if let Some(url) = url {
                config.client.url = url;
            }
            if let Some(username) = username {
                config.identity.username = username;
            }
            if display_name.is_some() {
                config.identity.display_name = display_name;
            }

            init_logging(&config.logging);
            run_chat(config, channel).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("chatsync={}", config.level).into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so they don't interleave with the conversation
    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_chat(config: Config, channel: String) -> Result<(), Box<dyn std::error::Error>> {
    let transport = WsTransport::new(config.client.connect_timeout());
    let store = RealtimeClientStore::with_policy(transport, config.client.reconnect_policy());
    let (handle, task) = store.spawn();

    tracing::info!("Chatsync v{}", env!("CARGO_PKG_VERSION"));
    handle.connect(config.client.url.clone())?;

    let username = config.identity.username.clone();
    let display_name = config.identity.display_name().to_string();
    println!(
        "Connecting to {} as {} (commands: /join <channel>, /typing on|off, /quit)",
        config.client.url, display_name
    );

    let (active_tx, active_rx) = watch::channel(channel);
    let printer = tokio::spawn(print_updates(handle.subscribe(), active_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let active = active_tx.borrow().clone();
        match parse_input(line) {
            Input::Quit => break,
            Input::Join(next) => {
                handle.stop_typing(active)?;
                active_tx.send_replace(next.to_string());
            }
            Input::Typing(true) => handle.start_typing(active)?,
            Input::Typing(false) => handle.stop_typing(active)?,
            Input::Say(text) => {
                if !handle.connection().is_connected() {
                    println!("* not connected, message not sent");
                    continue;
                }
                handle.send_message(active, text, username.as_str(), display_name.as_str())?;
            }
            Input::Unknown(command) => println!("* unknown command: {}", command),
        }
    }

    handle.shutdown()?;
    task.await?;
    printer.abort();
    Ok(())
}

/// What the terminal has already shown
#[derive(Debug, Default)]
struct Screen {
    printed: HashMap<String, usize>,
    connection: ConnectionState,
    typing: HashSet<String>,
}

impl Screen {
    /// Lines describing what changed in `state` since the last call
    fn updates(&mut self, state: &ChatState, channel: &str) -> Vec<String> {
        let mut lines = Vec::new();

        if state.connection() != self.connection {
            self.connection = state.connection();
            lines.push(format!("* {}", self.connection));
        }

        let messages = state.channel_messages(channel);
        let seen = self.printed.entry(channel.to_string()).or_insert(0);
        for message in &messages[*seen..] {
            let marker = if message.is_optimistic { " (sent)" } else { "" };
            lines.push(format!(
                "[#{}] {}: {}{}",
                channel, message.user.display_name, message.content, marker
            ));
        }
        *seen = messages.len();

        let mut typing = state.typing_users(channel);
        typing.remove(LOCAL_USER_ID);
        if typing != self.typing {
            if !typing.is_empty() {
                let mut names: Vec<_> = typing.iter().cloned().collect();
                names.sort();
                lines.push(format!("* {} typing in #{}", names.join(", "), channel));
            }
            self.typing = typing;
        }

        lines
    }
}

/// Print new messages, typing changes and connection changes as they happen
async fn print_updates(
    mut updates: watch::Receiver<ChatState>,
    mut active: watch::Receiver<String>,
) {
    let mut screen = Screen::default();

    loop {
        let channel = active.borrow_and_update().clone();
        // Release the state guard before writing to stdout
        let lines = screen.updates(&updates.borrow_and_update(), &channel);
        for line in lines {
            println!("{}", line);
        }

        tokio::select! {
            changed = updates.changed() => if changed.is_err() { break },
            changed = active.changed() => if changed.is_err() { break },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatsync::{Author, Frame, Message, TypingSignal};

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("hello there"), Input::Say("hello there"));
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/q"), Input::Quit);
        assert_eq!(parse_input("/join random"), Input::Join("random"));
        assert_eq!(parse_input("/typing on"), Input::Typing(true));
        assert_eq!(parse_input("/typing off"), Input::Typing(false));
        assert_eq!(parse_input("/join"), Input::Unknown("/join"));
        assert_eq!(parse_input("/dance"), Input::Unknown("/dance"));
    }

    #[test]
    fn test_screen_reports_only_new_updates() {
        let mut state = ChatState::new();
        state.apply(Frame::MessageCreate(Message::new(
            "m1",
            "general",
            Author::local("ada", "Ada"),
            "hi",
        )));
        state.apply(Frame::TypingStart(TypingSignal::new("general", "bob")));
        state.apply(Frame::TypingStart(TypingSignal::new("general", LOCAL_USER_ID)));

        let mut screen = Screen::default();
        assert_eq!(
            screen.updates(&state, "general"),
            vec!["[#general] Ada: hi", "* bob typing in #general"]
        );
        assert!(screen.updates(&state, "general").is_empty());

        state.apply(Frame::TypingEnd(TypingSignal::new("general", "bob")));
        assert!(screen.updates(&state, "general").is_empty());
        assert!(screen.typing.is_empty());
    }

    #[test]
    fn test_cli_parses_chat() {
        let cli = Cli::try_parse_from([
            "chatsync", "chat", "--channel", "random", "--url", "ws://example:9001",
        ])
        .unwrap();

        match cli.command {
            Commands::Chat { channel, url, .. } => {
                assert_eq!(channel, "random");
                assert_eq!(url.as_deref(), Some("ws://example:9001"));
            }
            Commands::Config { .. } => panic!("Expected Chat"),
        }
    }
}
