//! Command dispatch: bridges CLI args -> Hub actions -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod devices;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::HubContext;
use crate::error::CliError;
use crate::output::TerminalNotifier;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    ctx: &HubContext,
    global: &GlobalOpts,
    ui: &TerminalNotifier,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(ctx, &args, global, ui).await,
        Command::Register(args) => auth::register(ctx, &args, global, ui).await,
        Command::Logout => auth::logout(ctx),
        Command::Whoami => auth::whoami(ctx, global),
        Command::Devices(args) => devices::handle(ctx, args, global, ui).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
