//! A minimal shell execution core.
//!
//! One line of input becomes a pipeline of child processes wired together
//! with pipes and file redirections, with a small built-in command set
//! (`cd`, `pwd`, `set`, `unset`) and `$NAME` variable substitution. The
//! crate is the command-interpretation and process-orchestration layer an
//! interactive session is built on; line acquisition, editing and history
//! belong to the caller (see `src/main.rs` for the bundled binary).
//!
//! The main entry point is [`Shell`], which owns the per-instance state
//! (variable store, search path, background jobs) and drives one raw line
//! end to end. The public modules expose the individual pieces for
//! embedding and testing.

pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod executor;
pub mod expand;
pub mod jobs;
pub mod parser;
pub mod path;
pub mod shell;

pub use command::{Command, ExitCode, Pipeline};
pub use config::Limits;
pub use shell::Shell;
