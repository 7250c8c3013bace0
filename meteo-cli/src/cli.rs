use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use meteo_core::{
    Config, MeteoRequest, MeteoService, ProviderId, Settings,
    provider::provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Rain and wind outlook for a city and weekday")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "openmeteo".
        provider: String,
    },

    /// Show rain and wind for a city on the next given weekday.
    Check {
        /// City name, e.g. "Mestre".
        city: String,

        /// Italian weekday name, e.g. "lunedì".
        weekday: String,

        /// First hour of an explicit range; requires --end.
        #[arg(long, requires = "end")]
        start: Option<u32>,

        /// Hour the range stops before; requires --start.
        #[arg(long, requires = "start")]
        end: Option<u32>,

        /// Use this provider instead of the configured default.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Serve `POST /meteo` over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Check { city, weekday, start, end, provider } => {
                let config = load_config()?;
                let service = match provider {
                    Some(name) => {
                        let id = ProviderId::try_from(name.as_str())?;
                        MeteoService::new(provider_from_config(id, &config)?, settings_for(id, &config)?)
                    }
                    None => MeteoService::from_config(&config)?,
                };

                let request = MeteoRequest { city, weekday, start, end };
                let report = service.check(&request, chrono::Utc::now()).await.map_err(|e| {
                    anyhow::anyhow!("{} ({})", e.public_detail(), e)
                })?;

                print!("{}", crate::render::report_table(&request, &report));
                Ok(())
            }
            Command::Serve { addr } => {
                let config = load_config()?;
                let service = MeteoService::from_config(&config)?;
                crate::server::serve(addr, service).await
            }
        }
    }
}

/// Config from disk overlaid with the process environment.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env(std::env::vars());
    Ok(config)
}

/// Settings when the provider is chosen on the command line: thresholds follow
/// that provider unless configured explicitly.
fn settings_for(id: ProviderId, config: &Config) -> anyhow::Result<Settings> {
    let mut scoped = config.clone();
    scoped.set_default_provider(id);
    Ok(Settings::from_config(&scoped)?)
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = inquire::Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;

        config.upsert_provider_api_key(id, api_key.trim().to_string());
    } else if config.default_provider.is_none() {
        config.set_default_provider(id);
    }

    config.save()?;

    let path = Config::config_file_path()?;
    println!("Saved configuration for {id} to {}", path.display());
    Ok(())
}
