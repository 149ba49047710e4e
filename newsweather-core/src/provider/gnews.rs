use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::{Article, ArticleSet, article_id};

use super::truncate_body;

const GNEWS_BASE_URL: &str = "https://gnews.io";
const MISSING_DESCRIPTION: &str = "No description available";

pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_MAX: u32 = 20;

/// Client for the GNews search endpoint.
#[derive(Debug, Clone)]
pub struct GNewsClient {
    api_key: String,
    base_url: String,
    lang: String,
    max: u32,
    http: Client,
}

impl GNewsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: GNEWS_BASE_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            max: DEFAULT_MAX,
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

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    pub async fn search(&self, term: &str) -> Result<ArticleSet> {
        let url = format!("{}/api/v4/search", self.base_url);
        // first "Google" is dropped from the query
        let term = term.replacen("Google", "", 1);
        let term = term.trim();
        debug!(term, lang = %self.lang, max = self.max, "searching news");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", term),
                ("lang", self.lang.as_str()),
                ("max", &self.max.to_string()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to GNews (search)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read GNews search response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "GNews search request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: GnSearchResponse =
            serde_json::from_str(&body).context("Failed to parse GNews search JSON")?;

        Ok(parsed
            .articles
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(ordinal, a)| a.into_article(ordinal))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GnSource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GnArticle {
    #[serde(default)]
    title: String,
    description: Option<String>,
    image: Option<String>,
    url: String,
    source: GnSource,
    #[serde(rename = "publishedAt")]
    published_at: DateTime<Utc>,
}

impl GnArticle {
    fn into_article(self, ordinal: usize) -> Article {
        let description = self
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());

        Article {
            id: article_id(&self.url, ordinal),
            title: self.title,
            description,
            image_url: self.image,
            url: self.url,
            source_name: self.source.name,
            published_at: self.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GnSearchResponse {
    articles: Option<Vec<GnArticle>>,
}
