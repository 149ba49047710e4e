use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default geographic context used when location access is unavailable.
pub const FALLBACK_LATITUDE: f64 = 28.7041;
pub const FALLBACK_LONGITUDE: f64 = 77.1025;
pub const FALLBACK_COUNTRY: &str = "India";
pub const FALLBACK_CITY: &str = "Delhi";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Country/city labels produced by reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub country: String,
    pub city: String,
}

impl Place {
    pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self { country: country.into(), city: city.into() }
    }
}

/// The geographic context that weather and news are scoped to.
///
/// Coordinates are always populated. Country and city are only ever replaced
/// together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationContext {
    pub coordinates: Coordinates,
    pub country: String,
    pub city: String,
    pub is_default: bool,
}

impl LocationContext {
    /// Build a default context from a coordinate pair and its labels.
    pub fn fallback_at(coordinates: Coordinates, place: Place) -> Self {
        Self { coordinates, country: place.country, city: place.city, is_default: true }
    }

    /// Build a context for coordinates reported by the device.
    pub fn located(coordinates: Coordinates, place: Place) -> Self {
        Self { coordinates, country: place.country, city: place.city, is_default: false }
    }

    pub fn place(&self) -> Place {
        Place::new(self.country.clone(), self.city.clone())
    }

    /// Search term used for news when no explicit query is active.
    pub fn trending_term(&self) -> String {
        format!("{} trending", self.country)
    }
}

impl Default for LocationContext {
    fn default() -> Self {
        Self::fallback_at(
            Coordinates::new(FALLBACK_LATITUDE, FALLBACK_LONGITUDE),
            Place::new(FALLBACK_COUNTRY, FALLBACK_CITY),
        )
    }
}

/// Answer returned by a [`GeoProvider`](crate::GeoProvider) permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionGrant {
    Granted,
    Denied,
}

/// Session-level location permission as tracked by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Pending,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Pending => "pending",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A news article as returned by the news provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Source URL plus the ordinal in the provider response.
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
}

/// Ordered news results, provider relevance order.
pub type ArticleSet = Vec<Article>;

/// Derive the article id for the `ordinal`-th entry of a response.
pub fn article_id(url: &str, ordinal: usize) -> String {
    format!("{url}-{ordinal}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp_c: i32,
    pub condition: String,
    pub feels_like_c: i32,
    pub humidity_pct: u8,
    pub wind_kph: u32,
    pub pressure_mb: u32,
    pub location_label: String,
}
