pub mod chat;
pub mod config_cmd;
pub mod tools;

use sous_config::{AppConfig, ConfigError};

use crate::Overrides;

/// Load the file (or defaults), then environment, then command-line flags.
pub fn load_config(overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let mut config = match &overrides.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => AppConfig::load()?,
    };

    if let Some(model) = &overrides.model {
        config.model = model.clone();
    }
    if let Some(base_url) = &overrides.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(threshold) = overrides.compaction_threshold {
        config.agent.compaction_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}
