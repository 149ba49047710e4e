use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::model::{Coordinates, Place, WeatherSnapshot};

use super::truncate_body;

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
const UNKNOWN: &str = "Unknown";

/// Client for OpenWeather current conditions and reverse geocoding.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        what: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {what} JSON"))
    }

    async fn fetch_current(
        &self,
        coordinates: Coordinates,
        units: Option<&str>,
    ) -> Result<OwCurrentResponse> {
        let mut query = vec![
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
        ];
        if let Some(units) = units {
            query.push(("units", units.to_string()));
        }

        self.get_json("/data/2.5/weather", "current weather", &query).await
    }

    pub async fn current(&self, coordinates: Coordinates) -> Result<WeatherSnapshot> {
        debug!(%coordinates, "fetching current weather");
        let parsed = self.fetch_current(coordinates, Some("metric")).await?;

        let condition = parsed
            .weather
            .first()
            .map(|w| w.main.clone())
            .ok_or_else(|| anyhow!("OpenWeather current weather response has no conditions"))?;

        Ok(WeatherSnapshot {
            temp_c: parsed.main.temp.round() as i32,
            condition,
            feels_like_c: parsed.main.feels_like.round() as i32,
            humidity_pct: parsed.main.humidity,
            // m/s to km/h
            wind_kph: (parsed.wind.speed * 3.6).round().max(0.0) as u32,
            pressure_mb: parsed.main.pressure,
            location_label: parsed.name,
        })
    }

    /// Resolve labels for coordinates, falling back to the weather
    /// endpoint's station name when the geocoder has no match.
    pub async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Place> {
        debug!(%coordinates, "reverse geocoding");
        let query = [
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("limit", "1".to_string()),
        ];

        let entries: Vec<OwGeoEntry> =
            self.get_json("/geo/1.0/reverse", "reverse geocode", &query).await?;

        if let Some(entry) = entries.into_iter().next() {
            let country = non_empty(entry.country).unwrap_or_else(|| UNKNOWN.to_string());
            let city = non_empty(entry.name)
                .or_else(|| entry.local_names.and_then(|mut names| names.remove("en")))
                .unwrap_or_else(|| UNKNOWN.to_string());
            return Ok(Place { country, city });
        }

        debug!(%coordinates, "geocoder returned no match, trying weather station name");
        let current = self.fetch_current(coordinates, None).await?;

        match (current.sys, non_empty(Some(current.name))) {
            (Some(sys), Some(city)) => Ok(Place {
                country: non_empty(sys.country).unwrap_or_else(|| UNKNOWN.to_string()),
                city,
            }),
            _ => Err(anyhow!("OpenWeather has no place name for {coordinates}")),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: Option<String>,
    country: Option<String>,
    local_names: Option<HashMap<String, String>>,
}
