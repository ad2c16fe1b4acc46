//! Bridges the shared config crate to the CLI: applies flag overrides
//! and builds a ready-to-use `Hub` for the active profile.

use std::path::PathBuf;
use std::sync::Arc;

pub use hubctl_config::{
    Config, Profile, StateFile, config_path, load_config_or_default, save_config, state_file_for,
};
use hubctl_core::{Hub, HubConfig, Notifier, TokenPresenceResolver};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from `--profile` and the config.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    hubctl_config::active_profile_name(global.profile.as_deref(), cfg)
}

/// The directory holding per-profile session state.
pub fn state_dir(global: &GlobalOpts) -> PathBuf {
    global
        .state_dir
        .clone()
        .unwrap_or_else(hubctl_config::state_dir)
}

/// Sorted, comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Translate the active profile plus CLI overrides into a `HubConfig`.
///
/// Without a matching profile the built-in defaults apply, unless the
/// profile was named explicitly and no `--api-url` stands in for it.
pub fn resolve_hub_config(
    cfg: &Config,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<HubConfig, CliError> {
    let mut profile = match cfg.profiles.get(profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() && global.api_url.is_none() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name.into(),
                available: available_profiles(cfg),
            });
        }
        None => Profile::default(),
    };

    // Flag > env > profile
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    Ok(hubctl_config::profile_to_hub_config(&profile, &cfg.defaults)?)
}

/// Everything a session-bound command needs.
pub struct HubContext {
    pub hub: Hub,
    pub profile_name: String,
    pub profile: Option<Profile>,
    /// Holds the remembered username, whatever the token store.
    pub state: StateFile,
}

/// Build the `Hub` for the active profile and restore its session.
pub fn build_hub(global: &GlobalOpts, notifier: Arc<dyn Notifier>) -> Result<HubContext, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let hub_config = resolve_hub_config(&cfg, &profile_name, global)?;
    let profile = cfg.profiles.get(&profile_name).cloned();

    let state_dir = state_dir(global);
    let state = StateFile::new(state_file_for(&state_dir, &profile_name));
    let kind = hubctl_config::token_store_kind(profile.as_ref(), &cfg);
    let store = hubctl_config::token_store_for(kind, &profile_name, &state_dir);

    let remembered = state.remembered_username().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable state file");
        None
    });

    let hub = Hub::new(hub_config, store)?
        .with_notifier(notifier)
        .with_user_resolver(Arc::new(TokenPresenceResolver::with_last_username(
            remembered,
        )));
    hub.restore();

    tracing::debug!(profile = %profile_name, ?kind, hub = ?hub, "hub ready");

    Ok(HubContext {
        hub,
        profile_name,
        profile,
        state,
    })
}
