use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sipchat", about = "Chat rooms over a SIP-style messaging engine")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send one message and wait for its delivery report
    Send {
        /// Peer address, e.g. sip:alice@example.org
        #[arg(long)]
        to: String,
        /// Message text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Open an interactive console for one peer
    Chat {
        #[arg(long)]
        to: String,
    },
    /// Open rooms for the given peers and print their summaries
    Rooms {
        #[arg(long)]
        to: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_send_with_multi_word_text() {
        let cli = Cli::parse_from(["sipchat", "send", "--to", "sip:alice@example.org", "hi", "there"]);

        match cli.command {
            Command::Send { to, text } => {
                assert_eq!(to, "sip:alice@example.org");
                assert_eq!(text.join(" "), "hi there");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn send_requires_text() {
        let result = Cli::try_parse_from(["sipchat", "send", "--to", "sip:alice@example.org"]);

        assert!(result.is_err());
    }

    #[test]
    fn parses_chat_with_global_config() {
        let cli = Cli::parse_from(["sipchat", "chat", "--to", "bob@example.org", "--config", "custom.toml"]);

        assert!(matches!(cli.command, Command::Chat { ref to } if to == "bob@example.org"));
        assert_eq!(
            cli.config
                .as_deref()
                .map(|p| p.to_string_lossy().to_string()),
            Some("custom.toml".to_owned())
        );
    }

    #[test]
    fn rooms_accepts_repeated_peers() {
        let cli = Cli::parse_from([
            "sipchat",
            "rooms",
            "--to",
            "sip:alice@example.org",
            "--to",
            "sip:bob@example.org",
        ]);

        assert!(matches!(cli.command, Command::Rooms { ref to } if to.len() == 2));
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["sipchat"]).is_err());
    }
}
