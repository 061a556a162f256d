//! Initial viewport selection from the device position.
//!
//! The resolver hands out one [`GeolocationRequest`] per mount of the map view
//! and applies the first outcome reported for the current mount. Outcomes for
//! a mount that has since been torn down are dropped.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::MapSettings;
use crate::models::{Coordinates, Viewport};

/// Why no position was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location request timed out")]
    Timeout,
    #[error("location capability unavailable")]
    Unavailable,
    #[error("location lookup failed: {0}")]
    Failed(String),
}

/// Source of the device position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation(pub Coordinates);

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Host without a positioning capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGeolocation;

#[async_trait]
impl GeolocationProvider for UnavailableGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unavailable)
    }
}

/// User refused the location prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedGeolocation;

#[async_trait]
impl GeolocationProvider for DeniedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::PermissionDenied)
    }
}

/// Ask `provider` for a position, giving up after `timeout`.
pub async fn acquire_position(
    provider: &dyn GeolocationProvider,
    timeout: Duration,
) -> Result<Coordinates, GeolocationError> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}

/// Identifies one mount of the map view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(pub u64);

/// Position request the host must run and report back with [`GeolocationRequest::mount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationRequest {
    pub mount: MountId,
}

/// How the current viewport was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportSource {
    Located,
    Fallback(GeolocationError),
    Recentered,
}

/// Zoom levels and fallback center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportPolicy {
    pub local_zoom: u8,
    pub wide_zoom: u8,
    pub fallback_center: Coordinates,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self::from(&MapSettings::default())
    }
}

impl From<&MapSettings> for ViewportPolicy {
    fn from(settings: &MapSettings) -> Self {
        Self {
            local_zoom: settings.local_zoom,
            wide_zoom: settings.wide_zoom,
            fallback_center: Coordinates::new(
                settings.fallback_latitude,
                settings.fallback_longitude,
            ),
        }
    }
}

impl ViewportPolicy {
    pub fn fallback(&self) -> Viewport {
        Viewport::new(self.fallback_center, self.wide_zoom)
    }

    pub fn outcome_viewport(&self, outcome: &Result<Coordinates, GeolocationError>) -> Viewport {
        match outcome {
            Ok(center) => Viewport::new(*center, self.local_zoom),
            Err(_) => self.fallback(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeolocationResolver {
    policy: ViewportPolicy,
    mount: Option<MountId>,
    mounts_issued: u64,
    viewport: Option<(Viewport, ViewportSource)>,
}

impl GeolocationResolver {
    pub fn new(policy: ViewportPolicy) -> Self {
        Self {
            policy,
            mount: None,
            mounts_issued: 0,
            viewport: None,
        }
    }

    pub fn policy(&self) -> &ViewportPolicy {
        &self.policy
    }

    /// Mount the view. Returns a request only on a fresh mount; calling it
    /// again while mounted returns `None`.
    pub fn mount(&mut self) -> Option<GeolocationRequest> {
        if self.mount.is_some() {
            return None;
        }
        self.mounts_issued += 1;
        let mount = MountId(self.mounts_issued);
        self.mount = Some(mount);
        self.viewport = None;
        info!(mount = mount.0, "map view mounted, requesting position");
        Some(GeolocationRequest { mount })
    }

    /// Tear the view down. Pending outcomes for this mount will be ignored.
    pub fn unmount(&mut self) {
        self.mount = None;
    }

    pub fn current_mount(&self) -> Option<MountId> {
        self.mount
    }

    /// Apply a position outcome. Returns `true` if the viewport was set.
    pub fn resolve(
        &mut self,
        mount: MountId,
        outcome: Result<Coordinates, GeolocationError>,
    ) -> bool {
        if self.mount != Some(mount) {
            warn!(mount = mount.0, "position arrived after unmount, discarding");
            return false;
        }
        if self.viewport.is_some() {
            return false;
        }

        let viewport = self.policy.outcome_viewport(&outcome);
        let source = match outcome {
            Ok(_) => {
                info!(center = %viewport.center, zoom = viewport.zoom, "viewport from device position");
                ViewportSource::Located
            }
            Err(reason) => {
                // Expected on desktops and denied prompts
                info!(%reason, "using fallback viewport");
                ViewportSource::Fallback(reason)
            }
        };
        self.viewport = Some((viewport, source));
        true
    }

    /// Explicit recenter request. A later position outcome for the same mount
    /// no longer applies.
    pub fn recenter(&mut self, viewport: Viewport) {
        self.viewport = Some((viewport, ViewportSource::Recentered));
    }

    /// Resolved viewport, `None` while the position is pending.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport.as_ref().map(|(v, _)| *v)
    }

    pub fn source(&self) -> Option<&ViewportSource> {
        self.viewport.as_ref().map(|(_, s)| s)
    }

    /// What the map shows right now: the resolved viewport, or the fallback
    /// while the position is pending.
    pub fn effective_viewport(&self) -> Viewport {
        self.viewport().unwrap_or_else(|| self.policy.fallback())
    }
}

impl Default for GeolocationResolver {
    fn default() -> Self {
        Self::new(ViewportPolicy::default())
    }
}
