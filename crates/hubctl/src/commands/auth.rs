//! Session command handlers: login, register, logout, whoami.

use secrecy::SecretString;
use tracing::warn;

use hubctl_core::User;

use crate::cli::{AuthArgs, GlobalOpts};
use crate::config::HubContext;
use crate::error::CliError;
use crate::output::{self, TerminalNotifier};

use super::util;

fn user_detail(user: &User) -> String {
    format!("Logged in as {}", user.username)
}

/// Username: flag/env, profile, remembered, then an interactive prompt.
fn resolve_username(ctx: &HubContext, args: &AuthArgs) -> Result<String, CliError> {
    let known = args
        .username
        .clone()
        .or_else(|| hubctl_config::resolve_username(ctx.profile.as_ref()))
        .or_else(|| ctx.state.remembered_username().ok().flatten());
    if let Some(username) = known {
        return Ok(username);
    }
    util::prompt_text("Username")?.ok_or_else(|| CliError::NoCredentials {
        profile: ctx.profile_name.clone(),
    })
}

/// Password: stdin when asked, then env/keyring/config, then a prompt.
fn resolve_password(ctx: &HubContext, args: &AuthArgs) -> Result<SecretString, CliError> {
    if args.password_stdin {
        return util::read_password_stdin();
    }
    if let Some(password) = hubctl_config::resolve_password(ctx.profile.as_ref(), &ctx.profile_name)
    {
        return Ok(password);
    }
    util::prompt_password("Password: ")?.ok_or_else(|| CliError::Validation {
        field: "password".into(),
        reason: "no password available; use --password-stdin or HUBCTL_PASSWORD".into(),
    })
}

fn remember(ctx: &HubContext, user: &User) {
    if let Err(e) = ctx.state.remember_username(&user.username) {
        warn!(error = %e, "could not remember username");
    }
}

fn print_user(user: &User, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, user, user_detail, |u| u.username.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn login(
    ctx: &HubContext,
    args: &AuthArgs,
    global: &GlobalOpts,
    ui: &TerminalNotifier,
) -> Result<(), CliError> {
    let username = resolve_username(ctx, args)?;
    let password = resolve_password(ctx, args)?;

    let user = util::with_spinner(ui, "Logging in...", ctx.hub.login(&username, &password)).await?;
    remember(ctx, &user);
    print_user(&user, global)
}

pub async fn register(
    ctx: &HubContext,
    args: &AuthArgs,
    global: &GlobalOpts,
    ui: &TerminalNotifier,
) -> Result<(), CliError> {
    let username = resolve_username(ctx, args)?;
    let password = resolve_password(ctx, args)?;

    let user = util::with_spinner(
        ui,
        "Creating account...",
        ctx.hub.sign_up(&username, &password),
    )
    .await?;
    remember(ctx, &user);
    print_user(&user, global)
}

pub fn logout(ctx: &HubContext) -> Result<(), CliError> {
    ctx.hub.logout()?;
    if let Err(e) = ctx.state.forget_username() {
        warn!(error = %e, "could not forget username");
    }
    Ok(())
}

pub fn whoami(ctx: &HubContext, global: &GlobalOpts) -> Result<(), CliError> {
    let user = ctx.hub.current_user().ok_or(CliError::NotLoggedIn)?;
    print_user(&user, global)
}
