use crate::cli::ConfigCommands;
use crate::config::{normalize_api_endpoint, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_endpoint,
            no_activate,
        } => {
            let mut config = CliProfilesConfig::load()?;
            let profile_name = init_profile(
                &mut config,
                profile.as_deref().or(global_profile),
                &api_endpoint,
                no_activate,
            )?;
            let path = config.save()?;
            println!("Saved profile '{profile_name}' to {}", path.display());
            Ok(())
        }
    }
}

/// Point a profile at an API endpoint; returns the resolved profile name
pub fn init_profile(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    api_endpoint: &str,
    no_activate: bool,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(profile_name);
    let endpoint = normalize_api_endpoint(api_endpoint)?;

    config.profile_mut_or_default(&profile_name).api_endpoint = Some(endpoint);
    if !no_activate || config.active_profile.is_none() {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}
