//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quill_core::util::{is_http_url, normalize_text_option};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "cli-config.json";
pub const PROFILE_ENV: &str = "QUILL_PROFILE";
pub const API_ENDPOINT_ENV: &str = "QUILL_API_ENDPOINT";
pub const SESSION_KEY_ENV: &str = "QUILL_SESSION_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

/// Everything a sync run needs to reach the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub profile: String,
    pub api_endpoint: String,
    pub session_key: String,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    let dir = dirs::config_dir()
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".to_string()))?;
    Ok(dir.join("quill").join(CONFIG_FILE_NAME))
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn normalize_api_endpoint(value: &str) -> Result<String, CliError> {
    let trimmed = value.trim().trim_end_matches('/');
    if !is_http_url(trimmed) {
        return Err(CliError::Config(format!(
            "API endpoint must start with http:// or https:// (got '{value}')"
        )));
    }
    Ok(trimmed.to_string())
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, CliError> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            CliError::Config(format!("Failed to read config at {}: {error}", path.display()))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            CliError::Config(format!("Failed to parse config at {}: {error}", path.display()))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, CliError> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        if let Some(profile) = normalize_profile_name(explicit) {
            return profile;
        }
        if let Some(profile) = normalize_profile_name(std::env::var(PROFILE_ENV).ok().as_deref()) {
            return profile;
        }
        if let Some(profile) = normalize_profile_name(self.active_profile.as_deref()) {
            return profile;
        }
        "default".to_string()
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    /// Combine the selected profile with environment overrides.
    ///
    /// The session key only ever comes from the environment.
    pub fn sync_settings(
        &self,
        explicit_profile: Option<&str>,
        env_endpoint: Option<String>,
        env_session_key: Option<String>,
    ) -> Result<SyncSettings, CliError> {
        let profile = self.resolve_profile_name(explicit_profile);
        let api_endpoint = normalize_text_option(env_endpoint)
            .or_else(|| {
                self.profile(&profile)
                    .and_then(|stored| normalize_text_option(stored.api_endpoint.clone()))
            })
            .ok_or(CliError::SyncNotConfigured)?;
        let session_key =
            normalize_text_option(env_session_key).ok_or(CliError::SyncNotConfigured)?;

        Ok(SyncSettings {
            profile,
            api_endpoint: normalize_api_endpoint(&api_endpoint)?,
            session_key,
        })
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.api_endpoint = normalize_text_option(profile.api_endpoint.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config_with(endpoint: Option<&str>) -> CliProfilesConfig {
        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some("work".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "work".to_string(),
            CliProfile {
                api_endpoint: endpoint.map(str::to_string),
            },
        );
        config
    }

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" work ")), Some("work".to_string()));
    }

    #[test]
    fn normalize_api_endpoint_requires_http_scheme() {
        assert_eq!(
            normalize_api_endpoint(" https://api.example.com/ ").unwrap(),
            "https://api.example.com"
        );
        assert!(normalize_api_endpoint("api.example.com").is_err());
    }

    #[test]
    fn config_roundtrip_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        config_with(Some(" https://api.example.com ")).save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();

        assert_eq!(loaded.active_profile.as_deref(), Some("work"));
        assert_eq!(
            loaded.profile("work").unwrap().api_endpoint.as_deref(),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn missing_config_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_active() {
        let config = config_with(None);
        assert_eq!(config.resolve_profile_name(Some("mobile")), "mobile");
    }

    #[test]
    fn sync_settings_prefer_env_endpoint() {
        let config = config_with(Some("https://stored.example.com"));

        let settings = config
            .sync_settings(
                Some("work"),
                Some("https://env.example.com/".to_string()),
                Some("secret".to_string()),
            )
            .unwrap();

        assert_eq!(settings.api_endpoint, "https://env.example.com");
        assert_eq!(settings.session_key, "secret");
        assert_eq!(settings.profile, "work");
    }

    #[test]
    fn sync_settings_fall_back_to_profile_endpoint() {
        let config = config_with(Some("https://stored.example.com"));

        let settings = config
            .sync_settings(Some("work"), None, Some("secret".to_string()))
            .unwrap();

        assert_eq!(settings.api_endpoint, "https://stored.example.com");
    }

    #[test]
    fn sync_settings_require_endpoint_and_session_key() {
        let config = config_with(None);
        assert!(matches!(
            config.sync_settings(Some("work"), None, Some("secret".to_string())),
            Err(CliError::SyncNotConfigured)
        ));

        let config = config_with(Some("https://stored.example.com"));
        assert!(matches!(
            config.sync_settings(Some("work"), None, Some("  ".to_string())),
            Err(CliError::SyncNotConfigured)
        ));
    }
}
