//! Device location negotiation.
//!
//! `LocationCoordinator` turns the platform's permission lifecycle into a
//! single async answer: coordinates, a request for the rationale dialog, a
//! platform prompt that was just launched, or nothing available right now.

use crate::types::{Coordinates, LocationError};
use async_trait::async_trait;
use std::sync::Arc;

/// Platform primitives for location access.
#[async_trait]
pub trait LocationPlatform: Send + Sync {
    /// Whether location access is currently granted.
    fn is_authorized(&self) -> bool;

    /// True when access was denied but the user has not blocked it permanently.
    fn should_show_rationale(&self) -> bool;

    /// Launch the platform permission prompt. The answer arrives out of band.
    fn request_permission(&self);

    /// One-shot last known location.
    async fn last_known_location(&self) -> Result<Option<Coordinates>, LocationError>;
}

/// Result of a single resolve attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationOutcome {
    Resolved(Coordinates),
    /// Caller should explain why location is needed before asking again.
    RationaleNeeded,
    /// The platform prompt was launched; call `resolve` again once granted.
    PermissionRequested,
    /// Authorized, but the platform has no fix yet.
    Unavailable,
}

#[derive(Clone)]
pub struct LocationCoordinator {
    platform: Arc<dyn LocationPlatform>,
}

impl LocationCoordinator {
    pub fn new(platform: Arc<dyn LocationPlatform>) -> Self {
        Self { platform }
    }

    /// Resolve the device location once, without retrying.
    pub async fn resolve(&self) -> LocationOutcome {
        if !self.platform.is_authorized() {
            if self.platform.should_show_rationale() {
                tracing::debug!("Location not authorized, rationale required");
                return LocationOutcome::RationaleNeeded;
            }
            tracing::info!("Location not authorized, requesting permission");
            self.platform.request_permission();
            return LocationOutcome::PermissionRequested;
        }

        match self.platform.last_known_location().await {
            Ok(Some(coordinates)) => {
                tracing::info!("Got location: {}", coordinates);
                LocationOutcome::Resolved(coordinates)
            }
            Ok(None) => {
                tracing::debug!("No last known location available");
                LocationOutcome::Unavailable
            }
            Err(e) => {
                tracing::warn!("Location lookup failed: {}", e);
                LocationOutcome::Unavailable
            }
        }
    }

    /// Callback form of [`resolve`](Self::resolve).
    ///
    /// `on_resolved` fires once with the coordinates, `on_rationale` fires once
    /// when the rationale dialog is warranted. Neither fires otherwise.
    pub async fn resolve_with<R, P>(&self, on_resolved: R, on_rationale: P)
    where
        R: FnOnce(Coordinates),
        P: FnOnce(),
    {
        match self.resolve().await {
            LocationOutcome::Resolved(coordinates) => on_resolved(coordinates),
            LocationOutcome::RationaleNeeded => on_rationale(),
            LocationOutcome::PermissionRequested | LocationOutcome::Unavailable => {}
        }
    }

    /// Launch the platform prompt (used after the user accepts the rationale).
    pub fn request_permission(&self) {
        self.platform.request_permission();
    }
}

/// Location platform for hosts without a location service.
///
/// Authorized when coordinates are configured. Without them it reports a
/// soft denial so callers take the rationale path and can fall back.
#[derive(Debug, Clone, Default)]
pub struct FixedLocationPlatform {
    coordinates: Option<Coordinates>,
}

impl FixedLocationPlatform {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationPlatform for FixedLocationPlatform {
    fn is_authorized(&self) -> bool {
        self.coordinates.is_some()
    }

    fn should_show_rationale(&self) -> bool {
        self.coordinates.is_none()
    }

    fn request_permission(&self) {
        tracing::warn!("No location configured; set location.latitude/longitude in config");
    }

    async fn last_known_location(&self) -> Result<Option<Coordinates>, LocationError> {
        Ok(self.coordinates)
    }
}
