//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;

/// Environment variables the CLI reads
const ENV_VARS: [&str; 4] = ["VERSA_CONFIG", "VERSA_LOG_FORMAT", "VERSA_LOG_CONSOLE", "RUST_LOG"];

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output).await,
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output).await,
        ConfigAction::Validate => handle_config_validate(config, output).await,
    }
}

/// Handle config init subcommand
async fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        args.path
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("The file holds the built-in catalog; edit versions and features to match your API.")?;

    Ok(())
}

/// Handle config show subcommand
async fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let content = match args.format {
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    output.writeln(content.trim_end())
}

/// Handle config validate subcommand
async fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.info("Validating configuration...")?;

    if let Err(e) = config.validate() {
        output.error(&format!("✗ Configuration validation failed: {}", e))?;
        return Err(e);
    }
    output.success("✓ Configuration is valid")?;

    output.section("Configuration Sources")?;
    match &config.source {
        Some(path) => output.info(&format!("✓ Loaded from {}", path.display()))?,
        None => output.info("✗ No config file found, using the built-in catalog")?,
    }
    for path in Config::project_config_paths() {
        let marker = if path.exists() { "✓" } else { "✗" };
        output.info(&format!("{} Project config: {}", marker, path.display()))?;
    }
    if let Some(path) = Config::user_config_path() {
        let marker = if path.exists() { "✓" } else { "✗" };
        output.info(&format!("{} User config: {}", marker, path.display()))?;
    }

    let active: Vec<_> = ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok().map(|value| (*var, value)))
        .collect();
    if !active.is_empty() {
        output.section("Active Environment Variables")?;
        for (var, value) in active {
            output.info(&format!("• {} = {}", var, value))?;
        }
    }

    Ok(())
}
