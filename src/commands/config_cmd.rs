use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::{Config, StoreKind};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Shows the first and last few characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn masked_config(config: &Config) -> Config {
    let mut shown = config.clone();
    shown.remote.api_key = shown.remote.api_key.as_deref().map(mask);
    shown
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&masked_config(config))?);
                    }
                    OutputFormat::Text => print_text(config),
                }
                Ok(())
            }
        }
    }
}

fn print_text(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("store: {}", config.store.value);
    println!("  source: {}", config.store.source);
    println!();

    println!(
        "database_path: {}",
        config.database_path.value.display()
    );
    println!("  source: {}", config.database_path.source);
    println!();

    match &config.user_id.value {
        Some(user) => println!("user_id: {}", user),
        None => println!("user_id: (not set)"),
    }
    println!("  source: {}", config.user_id.source);
    if let Some(user) = config.effective_user_id() {
        if config.user_id.value.is_none() {
            println!("  effective: {}", user);
        }
    }
    println!();

    println!("week_start: {}", config.week_start);
    println!("water_goal: {} cup(s)", config.water_goal);
    println!();

    println!("remote:");
    println!(
        "  url: {}",
        config.remote.url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  api_key: {}",
        config
            .remote
            .api_key
            .as_deref()
            .map(mask)
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!(
        "  access_token: {}",
        if config.remote.access_token.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!("  timeout_secs: {}", config.remote.timeout_secs);
    if config.store.value == StoreKind::Remote && !config.remote.is_configured() {
        println!("  warning: store is remote but url or api_key is missing");
    }
    println!();

    println!("retry:");
    println!("  max_attempts: {}", config.retry.max_attempts);
    println!("  initial_backoff_ms: {}", config.retry.initial_backoff_ms);
    println!("  max_backoff_ms: {}", config.retry.max_backoff_ms);
}
