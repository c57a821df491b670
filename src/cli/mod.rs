//! CLI module - Command-line interface for gifbot
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// gifbot - paginated GIF search
/// Finds animated images for a text query, ten at a time
#[derive(Parser)]
#[command(name = "gifbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for GIFs and print one page of results
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// 1-based page to show
        #[arg(long, short, default_value = "1")]
        page: u32,
    },

    /// Show the page a cursor points at
    #[command(alias = "p")]
    Page {
        /// Cursor printed by a previous search
        cursor: String,
    },

    /// Manage the allow-list
    Allow {
        #[command(subcommand)]
        command: AllowCommands,
    },

    /// Talk to the bot from the terminal
    Chat {
        /// Identity to send messages as
        #[arg(long, short)]
        user: String,
    },

    /// Create default config file
    Init,
}

#[derive(Subcommand)]
pub enum AllowCommands {
    /// Allow a user
    Add {
        /// User ID
        id: String,
    },
    /// Revoke a user
    #[command(alias = "rm")]
    Remove {
        /// User ID
        id: String,
    },
    /// List allowed users
    #[command(alias = "ls")]
    List,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_joins_words_and_defaults_to_page_one() {
        let cli = Cli::try_parse_from(["gifbot", "search", "funny", "cats"]).unwrap();
        match cli.command {
            Some(Commands::Search { query, page }) => {
                assert_eq!(query, vec!["funny", "cats"]);
                assert_eq!(page, 1);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_allow_remove_alias() {
        let cli = Cli::try_parse_from(["gifbot", "allow", "rm", "42"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Allow {
                command: AllowCommands::Remove { ref id }
            }) if id == "42"
        ));
    }

    #[test]
    fn test_chat_requires_user() {
        assert!(Cli::try_parse_from(["gifbot", "chat"]).is_err());
    }
}
