//! The content orchestrator: owns the location context and the weather/news
//! state derived from it.
//!
//! Every context transition bumps a version counter. A fetch records the
//! version it started under and its result is applied only if that version
//! is still current, so a slow request for a superseded location can never
//! overwrite newer state. News searches are additionally numbered, and a
//! search that lands after a later one has already been applied is dropped.
//! State is held behind a single lock that is never kept across an `.await`;
//! operations may therefore interleave freely (for example `set_query` while
//! a news fetch is outstanding).

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{Failure, FailureKind},
    filter::filter,
    model::{ArticleSet, LocationContext, PermissionState, WeatherSnapshot},
    provider::{ContentClient, GeoProvider},
    resolver::{LocationResolver, Resolution},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub permission: PermissionState,
    pub context: LocationContext,
    pub context_version: u64,
    pub weather: Option<WeatherSnapshot>,
    /// The filtered view.
    pub articles: ArticleSet,
    /// Size of the full fetched set.
    pub total_articles: usize,
    pub query: String,
    pub refreshing: bool,
    pub phase: Phase,
}

#[derive(Debug)]
struct State {
    permission: PermissionState,
    context: LocationContext,
    version: u64,
    articles: ArticleSet,
    filtered: ArticleSet,
    weather: Option<WeatherSnapshot>,
    query: String,
    refreshes: u32,
    // fetches in flight for `version`
    pending: usize,
    news_issued: u64,
    news_applied: u64,
    failures: Vec<Failure>,
}

impl State {
    fn new(context: LocationContext) -> Self {
        Self {
            permission: PermissionState::Pending,
            context,
            version: 0,
            articles: Vec::new(),
            filtered: Vec::new(),
            weather: None,
            query: String::new(),
            refreshes: 0,
            pending: 0,
            news_issued: 0,
            news_applied: 0,
            failures: Vec::new(),
        }
    }

    fn refilter(&mut self) {
        self.filtered = if self.query.is_empty() {
            self.articles.clone()
        } else {
            filter(&self.articles, &self.query)
        };
    }

    fn apply_news(&mut self, term: &str, result: anyhow::Result<ArticleSet>) {
        match result {
            Ok(articles) => {
                debug!(%term, count = articles.len(), "news updated");
                self.articles = articles;
                self.refilter();
            }
            Err(err) => {
                let err = err.context(format!("News search for '{term}' failed"));
                self.record(Failure::from_error(FailureKind::Network, &err));
            }
        }
    }

    fn record(&mut self, failure: Failure) {
        warn!(%failure, "content failure");
        self.failures.push(failure);
    }
}

/// Marks one fetch in flight for a context version; settles it when dropped.
struct InFlight<'a> {
    state: &'a Mutex<State>,
    version: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.version == self.version {
            state.pending = state.pending.saturating_sub(1);
        }
    }
}

/// Keeps the refreshing flag raised for its lifetime.
struct Refreshing<'a>(&'a Mutex<State>);

impl Drop for Refreshing<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.refreshes = state.refreshes.saturating_sub(1);
    }
}

#[derive(Debug)]
pub struct ContentOrchestrator {
    resolver: LocationResolver,
    client: Arc<dyn ContentClient>,
    state: Mutex<State>,
}

impl ContentOrchestrator {
    pub fn new(
        geo: Arc<dyn GeoProvider>,
        client: Arc<dyn ContentClient>,
        fallback: LocationContext,
    ) -> Self {
        let resolver = LocationResolver::new(geo, client.clone(), fallback.clone());
        Self { resolver, client, state: Mutex::new(State::new(fallback)) }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            permission: state.permission,
            context: state.context.clone(),
            context_version: state.version,
            weather: state.weather.clone(),
            articles: state.filtered.clone(),
            total_articles: state.articles.len(),
            query: state.query.clone(),
            refreshing: state.refreshes > 0,
            phase: if state.pending > 0 { Phase::Loading } else { Phase::Idle },
        }
    }

    /// Drain the failures recorded since the last call.
    pub fn take_failures(&self) -> Vec<Failure> {
        std::mem::take(&mut self.state.lock().failures)
    }

    /// Resolve the starting location, then load weather and news for it.
    pub async fn initialize(&self) {
        let last_known = self.state.lock().context.clone();
        let resolution = self.resolver.resolve(&last_known).await;
        self.adopt(resolution).await;
    }

    /// Explicit user request to use device location.
    pub async fn enable_location(&self) {
        let last_known = self.state.lock().context.clone();
        let resolution = self.resolver.enable_location(&last_known).await;
        self.adopt(resolution).await;
    }

    async fn adopt(&self, resolution: Resolution) {
        {
            let mut state = self.state.lock();
            state.permission = resolution.permission;
            if let Some(failure) = resolution.failure {
                state.record(failure);
            }
        }
        self.on_location_context_changed(resolution.context).await;
    }

    /// Adopt `context` as a new version and fetch weather and news for it.
    pub async fn on_location_context_changed(&self, context: LocationContext) {
        {
            let mut state = self.state.lock();
            state.version += 1;
            state.pending = 0;
            info!(
                version = state.version,
                city = %context.city,
                country = %context.country,
                is_default = context.is_default,
                "location context changed"
            );
            state.context = context;
        }

        tokio::join!(self.fetch_weather(), self.fetch_news(None));
    }

    fn begin<T>(&self, read: impl FnOnce(&mut State) -> T) -> (InFlight<'_>, T) {
        let mut state = self.state.lock();
        state.pending += 1;
        let value = read(&mut state);
        (InFlight { state: &self.state, version: state.version }, value)
    }

    /// Apply a result if its context version is still current.
    fn settle(&self, ticket: &InFlight<'_>, what: &str, apply: impl FnOnce(&mut State)) {
        let mut state = self.state.lock();
        if state.version != ticket.version {
            debug!(
                what,
                stale = ticket.version,
                current = state.version,
                "discarding stale result"
            );
            return;
        }
        apply(&mut state);
    }

    pub async fn fetch_weather(&self) {
        let (ticket, coordinates) = self.begin(|s| s.context.coordinates);

        let result = self.client.get_weather(coordinates).await;

        self.settle(&ticket, "weather", |state| match result {
            Ok(weather) => state.weather = Some(weather),
            Err(err) => {
                let err = err.context("Weather update failed");
                state.record(Failure::from_error(FailureKind::Network, &err));
            }
        });
    }

    /// Search for `query`, or the context's trending term when absent.
    pub async fn fetch_news(&self, query: Option<&str>) {
        let explicit = query.map(str::trim).filter(|q| !q.is_empty());
        let (ticket, (seq, term)) = self.begin(|s| {
            s.news_issued += 1;
            let term = explicit.map(str::to_owned).unwrap_or_else(|| s.context.trending_term());
            (s.news_issued, term)
        });

        let result = self.client.search_news(&term).await;

        self.settle(&ticket, "news", |state| {
            if seq < state.news_applied {
                debug!(%term, seq, applied = state.news_applied, "discarding overtaken search");
                return;
            }
            state.news_applied = seq;
            state.apply_news(&term, result);
        });
    }

    /// Narrow the held articles locally; clearing an active search shows the
    /// full set again and then refetches the trending news.
    pub async fn set_query(&self, query: &str) {
        let cleared = {
            let mut state = self.state.lock();
            let was_active = !state.query.is_empty();
            state.query = query.trim().to_string();
            state.refilter();
            was_active && state.query.is_empty()
        };

        if cleared {
            self.fetch_news(None).await;
        }
    }

    /// Refetch weather and news together; the flag drops once both settle.
    pub async fn refresh(&self) {
        let (_refreshing, query) = {
            let mut state = self.state.lock();
            state.refreshes += 1;
            (Refreshing(&self.state), state.query.clone())
        };
        let query = (!query.is_empty()).then_some(query);

        tokio::join!(self.fetch_weather(), self.fetch_news(query.as_deref()));
    }
}
