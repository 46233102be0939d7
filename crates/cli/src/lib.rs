//! `tutor-cli`: the terminal front-end: argument parsing, config loading,
//! the chat REPL, and the progress-widget subcommands.

pub mod cli;
pub mod terminal;
