//! Turns a permission outcome and device coordinates into a [`LocationContext`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::{Failure, FailureKind},
    model::{LocationContext, PermissionGrant, PermissionState},
    provider::{ContentClient, GeoProvider},
};

/// Outcome of one resolution pass. Never an error: every failure path
/// degrades to a usable context and is described in `failure`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub context: LocationContext,
    pub permission: PermissionState,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    geo: Arc<dyn GeoProvider>,
    client: Arc<dyn ContentClient>,
    fallback: LocationContext,
}

impl LocationResolver {
    pub fn new(
        geo: Arc<dyn GeoProvider>,
        client: Arc<dyn ContentClient>,
        fallback: LocationContext,
    ) -> Self {
        Self { geo, client, fallback }
    }

    /// Resolve using the permission already granted (or not).
    ///
    /// `last_known` supplies the labels kept when reverse geocoding fails.
    pub async fn resolve(&self, last_known: &LocationContext) -> Resolution {
        let grant = self.geo.permission().await;
        self.resolve_with(grant, last_known).await
    }

    /// The user asked to enable location: request access, then resolve.
    pub async fn enable_location(&self, last_known: &LocationContext) -> Resolution {
        let grant = self.geo.request_permission().await;
        self.resolve_with(grant, last_known).await
    }

    async fn resolve_with(
        &self,
        grant: PermissionGrant,
        last_known: &LocationContext,
    ) -> Resolution {
        if grant == PermissionGrant::Denied {
            let message = format!(
                "Location permission denied; using {}, {}",
                self.fallback.city, self.fallback.country
            );
            return self.denied(Failure::new(FailureKind::Permission, message));
        }

        let coordinates = match self.geo.coordinates().await {
            Ok(c) => c,
            Err(err) => {
                let err = err.context("Could not get device coordinates");
                return self.denied(Failure::from_error(FailureKind::Permission, &err));
            }
        };
        debug!(%coordinates, "device coordinates obtained");

        match self.client.reverse_geocode(coordinates).await {
            Ok(place) => Resolution {
                context: LocationContext::located(coordinates, place),
                permission: PermissionState::Granted,
                failure: None,
            },
            Err(err) => {
                let err = err.context("Reverse geocoding failed");
                let failure = Failure::from_error(FailureKind::Geocode, &err);
                warn!(%failure, "keeping previous place labels");
                Resolution {
                    context: LocationContext::located(coordinates, last_known.place()),
                    permission: PermissionState::Granted,
                    failure: Some(failure),
                }
            }
        }
    }

    fn denied(&self, failure: Failure) -> Resolution {
        warn!(%failure, "falling back to default location");
        Resolution {
            context: self.fallback.clone(),
            permission: PermissionState::Denied,
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Place};
    use crate::testing::{FakeClient, FakeGeo};

    fn resolver(geo: FakeGeo, client: FakeClient) -> LocationResolver {
        LocationResolver::new(Arc::new(geo), Arc::new(client), LocationContext::default())
    }

    #[tokio::test]
    async fn denied_permission_yields_fallback() {
        let r = resolver(FakeGeo::denied(), FakeClient::default());
        let res = r.resolve(&LocationContext::default()).await;

        assert_eq!(res.permission, PermissionState::Denied);
        assert_eq!(res.context, LocationContext::default());
        assert!(res.context.is_default);
        let failure = res.failure.expect("permission failure reported");
        assert_eq!(failure.kind, FailureKind::Permission);
        assert!(failure.message.contains("Delhi, India"));
    }

    #[tokio::test]
    async fn coordinate_failure_counts_as_denied() {
        let r = resolver(FakeGeo::granted_without_coordinates(), FakeClient::default());
        let res = r.resolve(&LocationContext::default()).await;

        assert_eq!(res.permission, PermissionState::Denied);
        assert!(res.context.is_default);
        assert_eq!(res.failure.map(|f| f.kind), Some(FailureKind::Permission));
    }

    #[tokio::test]
    async fn granted_permission_geocodes_coordinates() {
        let client = FakeClient::default().with_place(Place::new("India", "Bengaluru"));
        let r = resolver(FakeGeo::granted(Coordinates::new(12.9, 77.6)), client);
        let res = r.resolve(&LocationContext::default()).await;

        assert_eq!(res.permission, PermissionState::Granted);
        assert_eq!(
            res.context,
            LocationContext::located(Coordinates::new(12.9, 77.6), Place::new("India", "Bengaluru"))
        );
        assert!(res.failure.is_none());
    }

    #[tokio::test]
    async fn geocode_failure_keeps_coordinates_and_last_labels() {
        let last =
            LocationContext::located(Coordinates::new(1.0, 2.0), Place::new("Kenya", "Nairobi"));
        let r = resolver(FakeGeo::granted(Coordinates::new(12.9, 77.6)), FakeClient::default());
        let res = r.resolve(&last).await;

        assert_eq!(res.permission, PermissionState::Granted);
        assert_eq!(res.context.coordinates, Coordinates::new(12.9, 77.6));
        assert_eq!(res.context.place(), Place::new("Kenya", "Nairobi"));
        assert!(!res.context.is_default);
        assert_eq!(res.failure.map(|f| f.kind), Some(FailureKind::Geocode));
    }

    #[tokio::test]
    async fn enable_location_requests_permission_first() {
        let geo = FakeGeo::denied_until_requested(Coordinates::new(12.9, 77.6));
        let client = FakeClient::default().with_place(Place::new("India", "Bengaluru"));
        let r = resolver(geo, client);

        let first = r.resolve(&LocationContext::default()).await;
        assert_eq!(first.permission, PermissionState::Denied);

        let second = r.enable_location(&first.context).await;
        assert_eq!(second.permission, PermissionState::Granted);
        assert_eq!(second.context.city, "Bengaluru");
    }
}
