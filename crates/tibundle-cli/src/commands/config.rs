//! The `config` command: show the tool configuration or its location.

use clap::Subcommand;
use tibundle_config::{Config, ConfigError};

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
}

pub fn handle_config(action: Option<ConfigAction>) -> Result<(), ConfigError> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("Configuration:");
            print!("{}", toml_string(&config));
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}

fn toml_string(config: &Config) -> String {
    toml::to_string_pretty(config).unwrap_or_else(|_| String::new())
}
