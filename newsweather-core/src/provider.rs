use crate::{
    Article, Config, Coordinates, PermissionGrant, Place, WeatherSnapshot,
    config::LocationMode,
    provider::{
        geo::{FixedGeoProvider, IpGeoProvider},
        gnews::GNewsClient,
        openweather::OpenWeatherClient,
    },
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod geo;
pub mod gnews;
pub mod openweather;

const USER_AGENT: &str = concat!("newsweather/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    GNews,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::GNews => "gnews",
            ProviderId::OpenWeather => "openweather",
        }
    }

    /// Environment variable that overrides the stored API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::GNews => "NEWSWEATHER_GNEWS_API_KEY",
            ProviderId::OpenWeather => "NEWSWEATHER_OPENWEATHER_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::GNews, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "gnews" => Ok(ProviderId::GNews),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: gnews, openweather."
            )),
        }
    }
}

/// Source of device location and location permission.
#[async_trait]
pub trait GeoProvider: Send + Sync + Debug {
    /// Current permission grant, without prompting.
    async fn permission(&self) -> PermissionGrant;

    /// Ask for permission explicitly (the user chose to enable location).
    async fn request_permission(&self) -> PermissionGrant {
        self.permission().await
    }

    async fn coordinates(&self) -> anyhow::Result<Coordinates>;
}

/// The three remote content calls the orchestrator depends on.
#[async_trait]
pub trait ContentClient: Send + Sync + Debug {
    async fn search_news(&self, term: &str) -> anyhow::Result<Vec<Article>>;

    async fn get_weather(&self, coordinates: Coordinates) -> anyhow::Result<WeatherSnapshot>;

    async fn reverse_geocode(&self, coordinates: Coordinates) -> anyhow::Result<Place>;
}

/// GNews for articles, OpenWeather for weather and geocoding.
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    news: GNewsClient,
    weather: OpenWeatherClient,
}

impl HttpContentClient {
    pub fn new(news: GNewsClient, weather: OpenWeatherClient) -> Self {
        Self { news, weather }
    }
}

#[async_trait]
impl ContentClient for HttpContentClient {
    async fn search_news(&self, term: &str) -> anyhow::Result<Vec<Article>> {
        self.news.search(term).await
    }

    async fn get_weather(&self, coordinates: Coordinates) -> anyhow::Result<WeatherSnapshot> {
        self.weather.current(coordinates).await
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> anyhow::Result<Place> {
        self.weather.reverse_geocode(coordinates).await
    }
}

/// Shared HTTP client honouring the configured request timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs()))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

fn require_api_key(config: &Config, id: ProviderId) -> anyhow::Result<String> {
    config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `newsweather configure {id}` or set {}.",
            id.env_var()
        )
    })
}

/// Construct the HTTP content client from config.
pub fn content_client_from_config(config: &Config) -> anyhow::Result<Arc<dyn ContentClient>> {
    let news_key = require_api_key(config, ProviderId::GNews)?;
    let weather_key = require_api_key(config, ProviderId::OpenWeather)?;
    let http = http_client(config)?;

    let news = GNewsClient::new(news_key)
        .with_http(http.clone())
        .with_lang(config.news.lang.clone())
        .with_max(config.news.max);
    let weather = OpenWeatherClient::new(weather_key).with_http(http);

    Ok(Arc::new(HttpContentClient::new(news, weather)))
}

/// Construct the geo provider selected by `[location] mode`.
pub fn geo_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn GeoProvider>> {
    let coordinates = config.location.coordinates();

    let provider: Arc<dyn GeoProvider> = match config.location.mode {
        LocationMode::Fixed => Arc::new(FixedGeoProvider::new(coordinates, true)),
        LocationMode::Disabled => Arc::new(FixedGeoProvider::new(coordinates, false)),
        LocationMode::Ip => Arc::new(IpGeoProvider::new(http_client(config)?)),
    };

    Ok(provider)
}

/// Cap an error body so log lines stay readable.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
