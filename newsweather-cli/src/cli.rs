use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use newsweather_core::{
    Config, ContentOrchestrator, LocationMode, ProviderId,
    provider::{content_client_from_config, geo_provider_from_config},
};
use tracing::{debug, info};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "newsweather", version, about = "Location-aware news and weather")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store credentials for a provider.
    Configure {
        /// Provider short name: "gnews" or "openweather".
        provider: String,
    },

    /// Show weather and headlines for the current location.
    Show {
        #[command(flatten)]
        location: LocationArgs,

        /// Narrow the headlines to those mentioning this text.
        #[arg(long)]
        query: Option<String>,
    },

    /// Browse and search headlines in a prompt loop.
    Interactive {
        #[command(flatten)]
        location: LocationArgs,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude of the device location.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the device location.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Estimate the location from the public IP address.
    #[arg(long, conflicts_with = "no_location")]
    ip: bool,

    /// Start on the default location; `:locate` enables access later.
    #[arg(long)]
    no_location: bool,
}

impl LocationArgs {
    fn apply(&self, config: &mut Config) {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.location.latitude = Some(lat);
            config.location.longitude = Some(lon);
            config.location.mode = LocationMode::Fixed;
        }
        if self.ip {
            config.location.mode = LocationMode::Ip;
        }
        if self.no_location {
            config.location.mode = LocationMode::Disabled;
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { location, query } => {
                let orchestrator = build(&location)?;
                orchestrator.initialize().await;
                if let Some(query) = query {
                    orchestrator.set_query(&query).await;
                }
                render::failures(&orchestrator.take_failures());
                render::snapshot(&orchestrator.snapshot());
                Ok(())
            }
            Command::Interactive { location } => {
                let orchestrator = build(&location)?;
                orchestrator.initialize().await;
                interactive(&orchestrator).await
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("{id} API key:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_string());
    config.save()?;
    info!(provider = %id, "stored provider credentials");

    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    for other in ProviderId::all().iter().filter(|p| !config.is_provider_configured(**p)) {
        println!("Next: run `newsweather configure {other}`");
    }
    Ok(())
}

fn build(location: &LocationArgs) -> anyhow::Result<ContentOrchestrator> {
    let mut config = Config::load()?;
    location.apply(&mut config);
    debug!(mode = ?config.location.mode, news_lang = %config.news.lang, "config loaded");

    let client = content_client_from_config(&config)?;
    let geo = geo_provider_from_config(&config)?;

    Ok(ContentOrchestrator::new(geo, client, config.fallback_context()))
}

const HELP: &str = "text searches, empty clears, :refresh, :locate, :quit";

async fn interactive(orchestrator: &ContentOrchestrator) -> anyhow::Result<()> {
    loop {
        render::failures(&orchestrator.take_failures());
        render::snapshot(&orchestrator.snapshot());

        let current = orchestrator.snapshot().query;
        let prompt = Text::new("search>").with_initial_value(&current).with_help_message(HELP);
        let input = match prompt.prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                debug!("prompt cancelled");
                break;
            }
            Err(err) => return Err(err).context("Failed to read input"),
        };

        match input.trim() {
            ":quit" | ":q" => {
                debug!("quit requested");
                break;
            }
            ":refresh" | ":r" => orchestrator.refresh().await,
            ":locate" | ":l" => orchestrator.enable_location().await,
            query => orchestrator.set_query(query).await,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_select_fixed_mode() {
        let cli = Cli::parse_from(["newsweather", "show", "--lat", "12.9", "--lon", "77.6"]);
        let Command::Show { location, query } = cli.command else {
            panic!("expected show");
        };
        assert!(query.is_none());

        let mut config = Config::default();
        config.location.mode = LocationMode::Ip;
        location.apply(&mut config);

        assert_eq!(config.location.mode, LocationMode::Fixed);
        assert_eq!(config.location.latitude, Some(12.9));
        assert_eq!(config.location.longitude, Some(77.6));
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::parse_from(["newsweather", "show", "--lat", "-33.87", "--lon", "151.21"]);
        let Command::Show { location, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(location.lat, Some(-33.87));
    }

    #[test]
    fn no_location_disables_access() {
        let cli = Cli::parse_from(["newsweather", "interactive", "--no-location"]);
        let Command::Interactive { location } = cli.command else {
            panic!("expected interactive");
        };

        let mut config = Config::default();
        location.apply(&mut config);
        assert_eq!(config.location.mode, LocationMode::Disabled);
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["newsweather", "show", "--lat", "12.9"]).is_err());
    }
}
