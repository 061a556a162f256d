//! Courts Map view controller.
//!
//! [`CourtsMapController`] is the single owner of the view's state: filters,
//! query bookkeeping, the result set, the selection, the viewport and the view
//! mode. Renderers read it; every write goes through one of its transition
//! methods. Work the host must perform (fetch a query, ask for the device
//! position, scroll a row) is queued as [`ViewEffect`]s and drained with
//! [`CourtsMapController::take_effects`].

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::{
    Coordinates, Court, CourtId, CourtStatus, FilterSet, FilterUpdate, Viewport,
};

use super::geolocation::{
    GeolocationError, GeolocationRequest, GeolocationResolver, MountId, ViewportPolicy,
};
use super::query::{build_query, QuerySeq, QueryTicket, QueryTracker};
use super::result_set::CourtResultSet;
use super::selection::{PinClickOutcome, SelectionCoordinator, SelectionState, SelectionTimings};
use super::view_mode::ViewMode;

/// Marker radius/color/weight for the normal and emphasized variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub radius: u8,
    pub color: &'static str,
    pub weight: u8,
}

pub const MARKER_NORMAL: MarkerStyle = MarkerStyle {
    radius: 6,
    color: "#22d3ee",
    weight: 2,
};

pub const MARKER_EMPHASIZED: MarkerStyle = MarkerStyle {
    radius: 10,
    color: "#60a5fa",
    weight: 4,
};

/// Host work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEffect {
    /// Run `GET /courts` for the ticket and report back with its sequence number.
    FetchCourts(QueryTicket),
    /// Ask for the device position and report back with the mount id.
    RequestPosition(GeolocationRequest),
    /// Scroll the list row of this court into view.
    ScrollIntoView(CourtId),
}

/// Non-fatal problem shown next to the filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// View time at which the notice was raised.
    pub raised_at: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    QueryFailed,
}

/// What happened to a reported query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer query was issued; the response was dropped.
    Stale,
    /// The current query failed; the previous result set stays.
    Failed,
    /// The view is not mounted.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: CourtId,
    pub name: String,
    pub position: Coordinates,
    pub emphasized: bool,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub id: CourtId,
    pub name: String,
    pub location: String,
    pub summary: String,
    pub hovered: bool,
    pub accented: bool,
    pub active: bool,
}

/// Everything the renderers need for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub view_mode: ViewMode,
    pub viewport: Viewport,
    pub viewport_resolved: bool,
    pub filters: FilterSet,
    pub loading: bool,
    pub notice: Option<Notice>,
    /// Empty in list-only mode.
    pub markers: Vec<MarkerView>,
    pub rows: Vec<RowView>,
    pub active: Option<CourtId>,
    pub hovered: Option<CourtId>,
}

#[derive(Debug, Clone)]
pub struct CourtsMapController {
    status: CourtStatus,
    filters: FilterSet,
    tracker: QueryTracker,
    results: CourtResultSet,
    selection: SelectionCoordinator,
    geolocation: GeolocationResolver,
    view_mode: ViewMode,
    notice: Option<Notice>,
    effects: Vec<ViewEffect>,
    mounted: bool,
    now: Duration,
}

impl CourtsMapController {
    pub fn new(policy: ViewportPolicy, timings: SelectionTimings) -> Self {
        Self {
            status: CourtStatus::Active,
            filters: FilterSet::default(),
            tracker: QueryTracker::new(),
            results: CourtResultSet::new(),
            selection: SelectionCoordinator::new(timings),
            geolocation: GeolocationResolver::new(policy),
            view_mode: ViewMode::default(),
            notice: None,
            effects: Vec::new(),
            mounted: false,
            now: Duration::ZERO,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            ViewportPolicy::from(&config.map),
            SelectionTimings::from(&config.selection),
        )
    }

    /// List courts with another moderation status (the admin review queue).
    pub fn with_status(mut self, status: CourtStatus) -> Self {
        self.status = status;
        self
    }

    // ==================== Lifecycle ====================

    /// Mount the view at view time `now`.
    ///
    /// A fresh mount requests the device position and issues the initial
    /// query. Mounting an already mounted view does nothing.
    pub fn mount(&mut self, now: Duration) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.now = now;
        self.selection.reset();
        if let Some(request) = self.geolocation.mount() {
            self.effects.push(ViewEffect::RequestPosition(request));
        }
        self.issue_query();
    }

    /// Leave the view. Clears the selection; in-flight results and positions
    /// reported afterwards are ignored.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        info!("map view unmounted");
        self.mounted = false;
        self.geolocation.unmount();
        self.selection.reset();
        self.effects.clear();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    // ==================== Query Builder ====================

    /// Replace the free-text search. Issues a query only if the text changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> Option<QuerySeq> {
        self.update_filter(FilterUpdate::Text(text.into()))
    }

    /// Apply one filter edit. Issues a query only if the filter set changed.
    pub fn update_filter(&mut self, update: FilterUpdate) -> Option<QuerySeq> {
        if !self.filters.apply(update) {
            return None;
        }
        self.issue_query()
    }

    /// Replace the whole filter set. Issues a query only if it differs.
    pub fn set_filters(&mut self, filters: FilterSet) -> Option<QuerySeq> {
        if self.filters == filters {
            return None;
        }
        self.filters = filters;
        self.issue_query()
    }

    /// Re-issue the current query.
    pub fn refresh(&mut self) -> Option<QuerySeq> {
        self.issue_query()
    }

    fn issue_query(&mut self) -> Option<QuerySeq> {
        if !self.mounted {
            return None;
        }
        let ticket = self.tracker.issue(build_query(self.status, &self.filters));
        let seq = ticket.seq;
        info!(%seq, query = %ticket.descriptor, "issuing courts query");
        self.effects.push(ViewEffect::FetchCourts(ticket));
        Some(seq)
    }

    // ==================== Result Set ====================

    /// Report the outcome of the fetch for `seq`.
    pub fn apply_response(
        &mut self,
        seq: QuerySeq,
        outcome: Result<Vec<Court>, ClientError>,
    ) -> ApplyOutcome {
        if !self.mounted {
            return ApplyOutcome::Ignored;
        }
        if !self.tracker.is_current(seq) {
            debug!(%seq, latest = ?self.tracker.last_issued(), "dropping stale response");
            return ApplyOutcome::Stale;
        }

        match outcome {
            Ok(courts) => {
                self.tracker.mark_applied(seq);
                info!(%seq, count = courts.len(), "applying courts");
                self.results.replace(courts, seq);
                let results = &self.results;
                self.selection.retain_listed(|id| results.contains(id));
                self.notice = None;
                ApplyOutcome::Applied
            }
            Err(err) => {
                // A failed ticket counts as settled
                self.tracker.mark_applied(seq);
                warn!(%seq, error = %err, "courts query failed, keeping previous results");
                self.notice = Some(Notice {
                    kind: NoticeKind::QueryFailed,
                    message: format!("Could not load courts: {}", err),
                    raised_at: self.now,
                });
                ApplyOutcome::Failed
            }
        }
    }

    // ==================== Geolocation ====================

    /// Report the position outcome for `mount`.
    pub fn resolve_position(
        &mut self,
        mount: MountId,
        outcome: Result<Coordinates, GeolocationError>,
    ) -> bool {
        self.geolocation.resolve(mount, outcome)
    }

    /// Explicit recenter request.
    pub fn recenter(&mut self, viewport: Viewport) {
        self.geolocation.recenter(viewport);
    }

    // ==================== Selection ====================

    /// Marker clicked. Never fails; an unlisted row just isn't scrolled to.
    /// Ignored while the view is unmounted.
    pub fn pin_click(&mut self, id: CourtId, now: Duration) -> PinClickOutcome {
        if !self.mounted {
            return PinClickOutcome::TargetNotMounted;
        }
        self.advance(now);
        let row_mounted = self.mounted && self.results.contains(&id);
        let outcome = self.selection.pin_click(id.clone(), row_mounted, now);
        if outcome == PinClickOutcome::Scrolled {
            self.effects.push(ViewEffect::ScrollIntoView(id));
        }
        outcome
    }

    /// List row hovered.
    pub fn row_hover(&mut self, id: CourtId, now: Duration) {
        if !self.mounted {
            return;
        }
        self.advance(now);
        self.selection.row_hover(id, now);
    }

    /// Move view time forward, firing due decay timers.
    pub fn advance(&mut self, now: Duration) -> bool {
        if now > self.now {
            self.now = now;
        }
        self.selection.advance(now)
    }

    /// Next timer deadline the host should wake up for.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.selection.next_deadline()
    }

    // ==================== View Mode ====================

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            debug!(?mode, "view mode");
            self.view_mode = mode;
        }
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.set_view_mode(self.view_mode.toggled());
        self.view_mode
    }

    // ==================== Accessors ====================

    pub fn take_effects(&mut self) -> Vec<ViewEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn status(&self) -> CourtStatus {
        self.status
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn results(&self) -> &CourtResultSet {
        &self.results
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn accented(&self) -> Option<&CourtId> {
        self.selection.accented()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.geolocation.viewport()
    }

    pub fn effective_viewport(&self) -> Viewport {
        self.geolocation.effective_viewport()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// A query is in flight and has not been applied.
    pub fn is_loading(&self) -> bool {
        self.tracker.is_pending()
    }

    pub fn last_issued(&self) -> Option<QuerySeq> {
        self.tracker.last_issued()
    }

    pub fn markers(&self) -> Vec<MarkerView> {
        self.results
            .markers()
            .map(|m| {
                let emphasized = self.selection.is_emphasized(&m.court.id);
                MarkerView {
                    id: m.court.id.clone(),
                    name: m.court.name.clone(),
                    position: m.position,
                    emphasized,
                    style: if emphasized {
                        MARKER_EMPHASIZED
                    } else {
                        MARKER_NORMAL
                    },
                }
            })
            .collect()
    }

    pub fn rows(&self) -> Vec<RowView> {
        let state = self.selection.state();
        self.results
            .rows()
            .iter()
            .map(|court| RowView {
                id: court.id.clone(),
                name: court.name.clone(),
                location: court.location_label(),
                summary: court.summary_label(),
                hovered: self.selection.hovered() == Some(&court.id),
                accented: self.selection.accented() == Some(&court.id),
                active: state.active.as_ref() == Some(&court.id),
            })
            .collect()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        let state = self.selection.state();
        MapSnapshot {
            view_mode: self.view_mode,
            viewport: self.effective_viewport(),
            viewport_resolved: self.viewport().is_some(),
            filters: self.filters.clone(),
            loading: self.is_loading(),
            notice: self.notice.clone(),
            markers: if self.view_mode.shows_map() {
                self.markers()
            } else {
                Vec::new()
            },
            rows: self.rows(),
            active: state.active.clone(),
            hovered: self.selection.hovered().cloned(),
        }
    }
}

impl Default for CourtsMapController {
    fn default() -> Self {
        Self::new(ViewportPolicy::default(), SelectionTimings::default())
    }
}
