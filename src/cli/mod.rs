//! CLI module - Command-line interface for Vellum
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Vellum - Editorial blog platform
/// A session-backed publishing server with a built-in web UI
#[derive(Parser)]
#[command(name = "vellum")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default when no command is given)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new account
    Create {
        /// Username for the new account
        username: String,
        /// Initial password (at least 6 characters)
        password: String,
        /// Email address (defaults to <username>@blog.local)
        #[arg(long)]
        email: Option<String>,
        /// Account role: admin, editor, or author
        #[arg(long, default_value = "author")]
        role: String,
    },

    /// List all accounts
    #[command(alias = "ls")]
    List,

    /// Deactivate an account so it can no longer sign in
    Deactivate {
        /// Username to deactivate
        username: String,
    },
}

pub use commands::*;
