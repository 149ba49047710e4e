//! In-memory geo provider and content client for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::{
    model::{
        Article, ArticleSet, Coordinates, PermissionGrant, Place, WeatherSnapshot, article_id,
    },
    provider::{ContentClient, GeoProvider},
};

#[derive(Debug)]
pub(crate) struct FakeGeo {
    allowed: AtomicBool,
    grant_on_request: bool,
    coordinates: Option<Coordinates>,
}

impl FakeGeo {
    pub(crate) fn denied() -> Self {
        Self { allowed: AtomicBool::new(false), grant_on_request: false, coordinates: None }
    }

    pub(crate) fn denied_until_requested(coordinates: Coordinates) -> Self {
        Self {
            allowed: AtomicBool::new(false),
            grant_on_request: true,
            coordinates: Some(coordinates),
        }
    }

    pub(crate) fn granted(coordinates: Coordinates) -> Self {
        Self {
            allowed: AtomicBool::new(true),
            grant_on_request: true,
            coordinates: Some(coordinates),
        }
    }

    pub(crate) fn granted_without_coordinates() -> Self {
        Self { allowed: AtomicBool::new(true), grant_on_request: true, coordinates: None }
    }
}

#[async_trait]
impl GeoProvider for FakeGeo {
    async fn permission(&self) -> PermissionGrant {
        if self.allowed.load(Ordering::SeqCst) {
            PermissionGrant::Granted
        } else {
            PermissionGrant::Denied
        }
    }

    async fn request_permission(&self) -> PermissionGrant {
        if self.grant_on_request {
            self.allowed.store(true, Ordering::SeqCst);
        }
        self.permission().await
    }

    async fn coordinates(&self) -> Result<Coordinates> {
        self.coordinates.ok_or_else(|| anyhow!("position unavailable"))
    }
}

/// Content client with scripted answers, call recording, and an optional
/// gate that holds selected calls until [`FakeClient::release`].
#[derive(Debug)]
pub(crate) struct FakeClient {
    place: Mutex<Option<Place>>,
    articles: Mutex<Option<ArticleSet>>,
    fail_news: AtomicBool,
    fail_weather: AtomicBool,
    slow_coordinates: Mutex<Option<Coordinates>>,
    slow_term: Mutex<Option<String>>,
    gate: Semaphore,
    pub(crate) started: Notify,
    news_terms: Mutex<Vec<String>>,
    weather_requests: Mutex<Vec<Coordinates>>,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            place: Mutex::new(None),
            articles: Mutex::new(None),
            fail_news: AtomicBool::new(false),
            fail_weather: AtomicBool::new(false),
            slow_coordinates: Mutex::new(None),
            slow_term: Mutex::new(None),
            gate: Semaphore::new(0),
            started: Notify::new(),
            news_terms: Mutex::new(Vec::new()),
            weather_requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeClient {
    pub(crate) fn with_place(self, place: Place) -> Self {
        *self.place.lock() = Some(place);
        self
    }

    pub(crate) fn with_articles(self, articles: ArticleSet) -> Self {
        *self.articles.lock() = Some(articles);
        self
    }

    pub(crate) fn set_fail_news(&self, fail: bool) {
        self.fail_news.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_weather(&self, fail: bool) {
        self.fail_weather.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn hold_weather_for(&self, coordinates: Coordinates) {
        *self.slow_coordinates.lock() = Some(coordinates);
    }

    pub(crate) fn hold_news_for(&self, term: &str) {
        *self.slow_term.lock() = Some(term.to_string());
    }

    /// Let every held call complete.
    pub(crate) fn release(&self) {
        self.gate.add_permits(64);
    }

    pub(crate) fn news_terms(&self) -> Vec<String> {
        self.news_terms.lock().clone()
    }

    pub(crate) fn weather_requests(&self) -> Vec<Coordinates> {
        self.weather_requests.lock().clone()
    }

    async fn wait_gate(&self) -> Result<()> {
        self.started.notify_one();
        let _permit = self.gate.acquire().await.map_err(|e| anyhow!("gate closed: {e}"))?;
        Ok(())
    }
}

#[async_trait]
impl ContentClient for FakeClient {
    async fn search_news(&self, term: &str) -> Result<Vec<Article>> {
        self.news_terms.lock().push(term.to_string());

        let held = self.slow_term.lock().as_deref() == Some(term);
        if held {
            self.wait_gate().await?;
        }

        if self.fail_news.load(Ordering::SeqCst) {
            return Err(anyhow!("news service unreachable"));
        }

        let scripted = self.articles.lock().clone();
        Ok(scripted.unwrap_or_else(|| {
            (0..3).map(|i| article(i, &format!("{term} story {i}"), "Wire")).collect()
        }))
    }

    async fn get_weather(&self, coordinates: Coordinates) -> Result<WeatherSnapshot> {
        self.weather_requests.lock().push(coordinates);

        let held = *self.slow_coordinates.lock() == Some(coordinates);
        if held {
            self.wait_gate().await?;
        }

        if self.fail_weather.load(Ordering::SeqCst) {
            return Err(anyhow!("weather service unreachable"));
        }

        Ok(weather_at(coordinates))
    }

    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<Place> {
        self.place.lock().clone().ok_or_else(|| anyhow!("no geocoding result"))
    }
}

pub(crate) fn weather_at(coordinates: Coordinates) -> WeatherSnapshot {
    WeatherSnapshot {
        temp_c: coordinates.latitude.round() as i32,
        condition: "Clear".into(),
        feels_like_c: coordinates.latitude.round() as i32,
        humidity_pct: 50,
        wind_kph: 10,
        pressure_mb: 1012,
        location_label: coordinates.to_string(),
    }
}

pub(crate) fn article(n: usize, title: &str, source: &str) -> Article {
    let url = format!("https://news.example/{n}");
    Article {
        id: article_id(&url, n),
        title: title.to_string(),
        description: format!("Details for {title}"),
        image_url: None,
        url,
        source_name: source.to_string(),
        published_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
    }
}

/// Ten articles, three of which mention climate.
pub(crate) fn ten_articles() -> ArticleSet {
    let titles = [
        "Climate talks stall",
        "Cricket league expands",
        "Metro line opens",
        "Heatwave and climate risk",
        "Startup raises funding",
        "Festival season begins",
        "Rupee steadies",
        "Election results due",
        "Monsoon forecast revised",
        "Film awards announced",
    ];
    titles
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let source = if i == 6 { "Climate Business Daily" } else { "City Desk" };
            article(i, t, source)
        })
        .collect()
}
