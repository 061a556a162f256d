//! Async driver for the Courts Map controller.
//!
//! [`MapDriver::run`] owns a [`CourtsMapController`] on one task and is the only
//! place that touches it. Backend fetches and the geolocation lookup run as
//! spawned tasks; their outcomes come back over a channel tagged with the query
//! sequence number or mount id, so the controller's own guards decide whether
//! they still apply. A [`MapSnapshot`] is published after every processed event.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::CourtsApi;
use crate::models::{Coordinates, Court, CourtId, FilterSet, FilterUpdate, Viewport};
use crate::services::{
    acquire_position, CourtsMapController, GeolocationError, GeolocationProvider, MapSnapshot,
    MountId, QuerySeq, ViewEffect, ViewMode,
};
use crate::session::SessionContext;

/// User input for the map view.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SetText(String),
    UpdateFilter(FilterUpdate),
    SetFilters(FilterSet),
    PinClick(CourtId),
    RowHover(CourtId),
    SetViewMode(ViewMode),
    ToggleViewMode,
    Recenter(Viewport),
    Refresh,
    DismissNotice,
    /// Leave the view and stop the driver.
    Unmount,
}

/// Text commands of the `courts-map` front end.
///
/// `q <text>`, `filter <field> <value>`, `clear <field>`, `hover <id>`,
/// `click <id>`, `mode map|list|toggle`, `recenter <lat> <lon> <zoom>`,
/// `refresh`, `dismiss` and `quit`.
impl FromStr for UiEvent {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let required = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", command, what))
            } else {
                Ok(rest)
            }
        };

        match command {
            "q" | "search" => Ok(UiEvent::SetText(rest.to_string())),
            "filter" => {
                let (field, value) = required("<field> <value>")?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: filter <field> <value>".to_string())?;
                FilterUpdate::parse(field, value.trim()).map(UiEvent::UpdateFilter)
            }
            "clear" => FilterUpdate::parse(required("<field>")?, "").map(UiEvent::UpdateFilter),
            "hover" => Ok(UiEvent::RowHover(CourtId::new(required("<id>")?))),
            "click" => Ok(UiEvent::PinClick(CourtId::new(required("<id>")?))),
            "mode" => match required("map|list|toggle")? {
                "toggle" => Ok(UiEvent::ToggleViewMode),
                mode => mode.parse().map(UiEvent::SetViewMode),
            },
            "recenter" => {
                let parts: Vec<&str> = required("<lat> <lon> <zoom>")?.split_whitespace().collect();
                let [lat, lon, zoom] = parts.as_slice() else {
                    return Err("usage: recenter <lat> <lon> <zoom>".to_string());
                };
                let number = |raw: &str| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| format!("'{}' is not a coordinate", raw))
                };
                let latitude = number(*lat)?;
                let longitude = number(*lon)?;
                if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                    return Err("coordinates out of range".to_string());
                }
                let zoom = zoom
                    .parse::<u8>()
                    .map_err(|_| format!("'{}' is not a zoom level", zoom))?;
                Ok(UiEvent::Recenter(Viewport::new(
                    Coordinates::new(latitude, longitude),
                    zoom,
                )))
            }
            "refresh" => Ok(UiEvent::Refresh),
            "dismiss" => Ok(UiEvent::DismissNotice),
            "quit" | "exit" => Ok(UiEvent::Unmount),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

enum Completion {
    Query {
        seq: QuerySeq,
        result: Result<Vec<Court>, ClientError>,
    },
    Position {
        mount: MountId,
        outcome: Result<Coordinates, GeolocationError>,
    },
}

/// Sending half for UI events plus the published state.
#[derive(Debug)]
pub struct MapHandle {
    events: mpsc::UnboundedSender<UiEvent>,
    snapshots: watch::Receiver<MapSnapshot>,
    scrolls: mpsc::UnboundedReceiver<CourtId>,
}

impl MapHandle {
    /// Queue an event. Returns `false` once the driver has stopped.
    pub fn send(&self, event: UiEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MapSnapshot> {
        self.snapshots.clone()
    }

    /// Next row the list should scroll to, if one was requested.
    pub fn try_next_scroll(&mut self) -> Option<CourtId> {
        self.scrolls.try_recv().ok()
    }
}

pub struct MapDriver {
    controller: CourtsMapController,
    api: Arc<dyn CourtsApi>,
    geolocation: Arc<dyn GeolocationProvider>,
    bearer: Option<String>,
    geolocation_timeout: Duration,
}

impl MapDriver {
    pub fn new(
        controller: CourtsMapController,
        api: Arc<dyn CourtsApi>,
        geolocation: Arc<dyn GeolocationProvider>,
    ) -> Self {
        Self {
            controller,
            api,
            geolocation,
            bearer: None,
            geolocation_timeout: ClientConfig::default().map.geolocation_timeout(),
        }
    }

    /// Controller and timeouts taken from `config`.
    pub fn from_config(
        config: &ClientConfig,
        api: Arc<dyn CourtsApi>,
        geolocation: Arc<dyn GeolocationProvider>,
    ) -> Self {
        Self::new(CourtsMapController::from_config(config), api, geolocation)
            .with_geolocation_timeout(config.map.geolocation_timeout())
    }

    /// Send the session's bearer token with every fetch.
    pub fn with_session(mut self, session: &SessionContext) -> Self {
        self.bearer = session.bearer().map(str::to_string);
        self
    }

    pub fn with_geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.geolocation_timeout = timeout;
        self
    }

    /// Spawn the driver on the current runtime.
    ///
    /// The join handle yields the controller once the view is unmounted or every
    /// [`MapHandle`] is dropped.
    pub fn spawn(self) -> (MapHandle, JoinHandle<CourtsMapController>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(self.controller.snapshot());
        let (scroll_tx, scroll_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(event_rx, snapshot_tx, scroll_tx));
        let handle = MapHandle {
            events: event_tx,
            snapshots: snapshot_rx,
            scrolls: scroll_rx,
        };
        (handle, task)
    }

    /// Mount the view and process events until it is unmounted.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<UiEvent>,
        snapshots: watch::Sender<MapSnapshot>,
        scrolls: mpsc::UnboundedSender<CourtId>,
    ) -> CourtsMapController {
        let start = Instant::now();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        self.controller.mount(start.elapsed());
        self.dispatch(&done_tx, &scrolls);
        snapshots.send_replace(self.controller.snapshot());
        info!("map driver started");

        while self.controller.is_mounted() {
            let deadline = self.controller.next_deadline();
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(start + at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event, start.elapsed()),
                    None => {
                        debug!("event channel closed");
                        self.controller.unmount();
                    }
                },
                Some(done) = done_rx.recv() => self.complete(done, start.elapsed()),
                _ = timer => {
                    self.controller.advance(start.elapsed());
                }
            }

            self.dispatch(&done_tx, &scrolls);
            snapshots.send_replace(self.controller.snapshot());
        }

        info!("map driver stopped");
        self.controller
    }

    fn handle(&mut self, event: UiEvent, now: Duration) {
        self.controller.advance(now);
        match event {
            UiEvent::SetText(text) => {
                self.controller.set_text(text);
            }
            UiEvent::UpdateFilter(update) => {
                self.controller.update_filter(update);
            }
            UiEvent::SetFilters(filters) => {
                self.controller.set_filters(filters);
            }
            UiEvent::PinClick(id) => {
                let outcome = self.controller.pin_click(id, now);
                debug!(?outcome, "pin click");
            }
            UiEvent::RowHover(id) => self.controller.row_hover(id, now),
            UiEvent::SetViewMode(mode) => self.controller.set_view_mode(mode),
            UiEvent::ToggleViewMode => {
                self.controller.toggle_view_mode();
            }
            UiEvent::Recenter(viewport) => self.controller.recenter(viewport),
            UiEvent::Refresh => {
                self.controller.refresh();
            }
            UiEvent::DismissNotice => self.controller.dismiss_notice(),
            UiEvent::Unmount => self.controller.unmount(),
        }
    }

    fn complete(&mut self, done: Completion, now: Duration) {
        self.controller.advance(now);
        match done {
            Completion::Query { seq, result } => {
                let outcome = self.controller.apply_response(seq, result);
                debug!(%seq, ?outcome, "query completed");
            }
            Completion::Position { mount, outcome } => {
                self.controller.resolve_position(mount, outcome);
            }
        }
    }

    fn dispatch(
        &mut self,
        done: &mpsc::UnboundedSender<Completion>,
        scrolls: &mpsc::UnboundedSender<CourtId>,
    ) {
        for effect in self.controller.take_effects() {
            match effect {
                ViewEffect::FetchCourts(ticket) => {
                    let api = Arc::clone(&self.api);
                    let bearer = self.bearer.clone();
                    let tx = done.clone();
                    tokio::spawn(async move {
                        let result = api.list_courts(&ticket.descriptor, bearer.as_deref()).await;
                        // The receiver is gone once the driver stops
                        let _ = tx.send(Completion::Query {
                            seq: ticket.seq,
                            result,
                        });
                    });
                }
                ViewEffect::RequestPosition(request) => {
                    let provider = Arc::clone(&self.geolocation);
                    let timeout = self.geolocation_timeout;
                    let tx = done.clone();
                    tokio::spawn(async move {
                        let outcome = acquire_position(provider.as_ref(), timeout).await;
                        let _ = tx.send(Completion::Position {
                            mount: request.mount,
                            outcome,
                        });
                    });
                }
                ViewEffect::ScrollIntoView(id) => {
                    let _ = scrolls.send(id);
                }
            }
        }
    }
}
