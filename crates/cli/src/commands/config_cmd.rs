//! `sous config` — show the effective configuration.

use sous_config::AppConfig;

use crate::Overrides;

pub fn run(overrides: &Overrides, default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        println!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = super::load_config(overrides).map_err(|e| format!("Failed to load config: {e}"))?;
    println!(
        "# {}",
        overrides
            .config
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
            .display()
    );
    println!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

/// The configuration with its secret masked.
fn redacted(mut config: AppConfig) -> AppConfig {
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    config
}
