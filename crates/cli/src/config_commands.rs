use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    botplus_config::{BotplusConfig, apply_env_overrides, discover_and_load, load_config},
    clap::{Subcommand, ValueEnum},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets redacted.
    Show {
        #[arg(long, value_enum, default_value_t = Format::Toml)]
        format: Format,
    },
    /// Print the path of the config file in use.
    Path,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

/// Load `explicit` if given, otherwise discover the config file. Env
/// overrides are applied either way.
pub fn load(explicit: Option<&Path>) -> Result<(BotplusConfig, Option<PathBuf>)> {
    let Some(path) = explicit else {
        return Ok(discover_and_load());
    };
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok((config, Some(path.to_path_buf())))
}

pub fn handle_config(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let (config, path) = load(explicit)?;
    match action {
        ConfigAction::Show { format } => {
            print!("{}", render(&config, format)?);
        },
        ConfigAction::Path => match path {
            Some(path) => println!("{}", path.display()),
            None => eprintln!("No config file found; using defaults."),
        },
    }
    Ok(())
}

fn render(config: &BotplusConfig, format: Format) -> Result<String> {
    let redacted = config.redacted();
    let out = match format {
        Format::Toml => toml::to_string_pretty(&redacted).context("rendering TOML")?,
        Format::Yaml => serde_yaml::to_string(&redacted).context("rendering YAML")?,
        Format::Json => {
            let mut json =
                serde_json::to_string_pretty(&redacted).context("rendering JSON")?;
            json.push('\n');
            json
        },
    };
    Ok(out)
}
