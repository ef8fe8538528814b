use crate::config::settings::Settings;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Path of the configuration file: `CONFIG_PATH` if set, `config.toml` otherwise.
pub fn get_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_config() -> Result<Settings, anyhow::Error> {
    load_config_from_path(&get_config_path())
}

pub fn load_config_from_path(config_path: &str) -> Result<Settings, anyhow::Error> {
    let config_str = std::fs::read_to_string(config_path)?;
    let settings = parse_config(&config_str)?;
    debug!("Loaded configuration from {}", config_path);
    Ok(settings)
}

pub fn parse_config(config_str: &str) -> Result<Settings, anyhow::Error> {
    let settings: Settings = toml::from_str(config_str)?;
    settings.validate()?;
    Ok(settings)
}
