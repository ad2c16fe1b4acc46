//! Config subcommand handlers. None of these touch the network.

use dialoguer::{Input, Select};
use serde::Serialize;
use tabled::Tabled;

use hubctl_config::TokenStoreKind;
use hubctl_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    cfg
}

fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# unrenderable config: {e}"))
}

fn save_config(cfg: &Config, quiet: bool) -> Result<(), CliError> {
    let path = config::save_config(cfg)?;
    if !quiet {
        eprintln!("✓ Configuration written to {}", path.display());
    }
    Ok(())
}

#[derive(Serialize)]
struct ProfileView {
    name: String,
    api_url: String,
    username: Option<String>,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "API URL")]
    api_url: String,
    #[tabled(rename = "Username")]
    username: String,
}

impl From<&ProfileView> for ProfileRow {
    fn from(p: &ProfileView) -> Self {
        Self {
            marker: if p.default { "*" } else { "" },
            name: p.name.clone(),
            api_url: p.api_url.clone(),
            username: p.username.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

fn profile_views(cfg: &Config) -> Vec<ProfileView> {
    let mut views: Vec<ProfileView> = cfg
        .profiles
        .iter()
        .map(|(name, p)| ProfileView {
            name: name.clone(),
            api_url: p.api_url.clone(),
            username: p.username.clone(),
            default: cfg.default_profile.as_deref() == Some(name.as_str()),
        })
        .collect();
    views.sort_by(|a, b| a.name.cmp(&b.name));
    views
}

/// Ask where the password goes. `Some` means plaintext in the config.
fn prompt_password_storage(profile_name: &str, password: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(CliError::prompt)?;

    if selection == 0 {
        hubctl_config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("hubctl configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(CliError::prompt)?;

    let api_url: String = Input::new()
        .with_prompt("Backend URL")
        .default(DEFAULT_API_URL.into())
        .validate_with(|url: &String| {
            hubctl_core::HubConfig::from_url_str(url)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(CliError::prompt)?;

    let username: String = Input::new()
        .with_prompt("Username (leave empty to be asked at login)")
        .allow_empty(true)
        .interact_text()
        .map_err(CliError::prompt)?;

    let password = if username.trim().is_empty() {
        None
    } else {
        let pass = rpassword::prompt_password("Password (leave empty to be asked at login): ")
            .map_err(CliError::prompt)?;
        if pass.is_empty() {
            None
        } else {
            prompt_password_storage(&profile_name, &pass)?
        }
    };

    let store_choices = &["State file (default)", "System keyring"];
    let token_store = match Select::new()
        .with_prompt("Where to keep the session token?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(CliError::prompt)?
    {
        0 => None,
        _ => Some(TokenStoreKind::Keyring),
    };

    let profile = Profile {
        username: Some(username.trim().to_owned()).filter(|u| !u.is_empty()),
        password,
        token_store,
        ..Profile::with_api_url(api_url.trim())
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    save_config(&cfg, global.quiet)?;

    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Next: hubctl login");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let views = profile_views(&cfg);
            let out = output::render_list(
                &global.output,
                views.as_slice(),
                |p| ProfileRow::from(p),
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name);
            save_config(&cfg, global.quiet)
        }

        ConfigCommand::Set { key, value } => {
            let cfg = config::load_config_or_default();
            let updated = hubctl_config::set_key(&cfg, &key, &value)?;
            save_config(&updated, global.quiet)
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                username: Some("alice".into()),
                password: Some("hunter2".into()),
                ..Profile::with_api_url("https://hub.example.com")
            },
        );

        let shown = format_config(&redacted(&cfg));
        assert!(shown.contains("****"));
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("alice"));
    }

    #[test]
    fn profiles_sorted_with_default_marked() {
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), Profile::default());
        cfg.profiles.insert("default".into(), Profile::default());

        let views = profile_views(&cfg);
        let names: Vec<_> = views.iter().map(|v| (v.name.as_str(), v.default)).collect();
        assert_eq!(names, vec![("default", true), ("lab", false)]);
    }
}
