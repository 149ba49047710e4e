//! Core library for the `newsweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Contracts for location, news and weather providers, plus HTTP implementations
//! - Location resolution with a fixed fallback
//! - The content orchestrator that keeps weather and news in step with the
//!   active location and the user's search
//!
//! It is used by `newsweather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, LocationMode, ProviderConfig};
pub use error::{Failure, FailureKind};
pub use model::{
    Article, ArticleSet, Coordinates, LocationContext, PermissionGrant, PermissionState, Place,
    WeatherSnapshot,
};
pub use orchestrator::{ContentOrchestrator, Phase, Snapshot};
pub use provider::{ContentClient, GeoProvider, ProviderId};
pub use resolver::{LocationResolver, Resolution};
