//! Command dispatch.

pub mod config_cmd;
pub mod probe;
pub mod sites;
pub mod stats;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Route a command that works on the relay state.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sites(args) => sites::handle(ctx, args, global),
        Command::Stats(args) => stats::handle(ctx, &args, global),
        Command::Probe(args) => probe::handle(ctx, args, global).await,
        // Handled before a context is built.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
