//! Geo providers for hosts without positioning hardware.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::{Coordinates, PermissionGrant};

use super::{GeoProvider, truncate_body};

const IPAPI_URL: &str = "https://ipapi.co/json/";

fn grant(allowed: bool) -> PermissionGrant {
    if allowed { PermissionGrant::Granted } else { PermissionGrant::Denied }
}

/// Coordinates supplied by configuration or command-line flags.
///
/// Access starts granted or withheld; an explicit permission request grants it,
/// which is how a user "enables location" after starting on the fallback.
#[derive(Debug)]
pub struct FixedGeoProvider {
    coordinates: Option<Coordinates>,
    allowed: AtomicBool,
}

impl FixedGeoProvider {
    pub fn new(coordinates: Option<Coordinates>, allowed: bool) -> Self {
        Self { coordinates, allowed: AtomicBool::new(allowed) }
    }
}

#[async_trait]
impl GeoProvider for FixedGeoProvider {
    async fn permission(&self) -> PermissionGrant {
        grant(self.allowed.load(Ordering::SeqCst))
    }

    async fn request_permission(&self) -> PermissionGrant {
        self.allowed.store(true, Ordering::SeqCst);
        self.permission().await
    }

    async fn coordinates(&self) -> Result<Coordinates> {
        self.coordinates.ok_or_else(|| {
            anyhow!(
                "No coordinates configured.\n\
                 Hint: pass --lat/--lon or set [location] latitude/longitude in the config file."
            )
        })
    }
}

/// Coordinates estimated from the public IP address.
#[derive(Debug)]
pub struct IpGeoProvider {
    url: String,
    http: Client,
}

impl IpGeoProvider {
    pub fn new(http: Client) -> Self {
        Self { url: IPAPI_URL.to_string(), http }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[async_trait]
impl GeoProvider for IpGeoProvider {
    async fn permission(&self) -> PermissionGrant {
        PermissionGrant::Granted
    }

    async fn coordinates(&self) -> Result<Coordinates> {
        debug!(url = %self.url, "geolocating by IP");

        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Failed to send request to ipapi.co")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read ipapi.co response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "ipapi.co request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: IpApiResult =
            serde_json::from_str(&body).context("Failed to parse ipapi.co JSON")?;

        match (parsed.latitude, parsed.longitude) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(anyhow!("ipapi.co response did not include coordinates")),
        }
    }
}
