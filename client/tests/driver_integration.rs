//! Map driver end to end with paused time.

mod support;

use std::sync::Arc;
use std::time::Duration;

use courtfinder_client::error::ClientError;
use courtfinder_client::http::LocalCourtsApi;
use courtfinder_client::models::{Coordinates, CourtId, Viewport};
use courtfinder_client::runtime::{MapDriver, UiEvent};
use courtfinder_client::services::{
    CourtsMapController, DeniedGeolocation, FixedGeolocation, GeolocationError, ViewMode,
};
use courtfinder_client::session::{MemoryTokenStore, SessionContext};

use support::{court, ids, DelayedGeolocation, ScriptedCourtsApi};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

async fn sleep_ms(n: u64) {
    tokio::time::sleep(ms(n)).await;
}

fn driver(api: ScriptedCourtsApi) -> MapDriver {
    MapDriver::new(
        CourtsMapController::default(),
        Arc::new(api),
        Arc::new(DeniedGeolocation),
    )
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_and_fallback_viewport() {
    let api = ScriptedCourtsApi::new().respond(
        "",
        ms(20),
        vec![court("a", "Alpha", 40.0, -75.0), court("b", "Bravo", 41.0, -74.0)],
    );
    let (handle, _task) = driver(api).spawn();

    sleep_ms(50).await;
    let snapshot = handle.snapshot();
    assert_eq!(ids(&snapshot.rows), vec!["a", "b"]);
    assert_eq!(snapshot.markers.len(), 2);
    assert!(!snapshot.loading);
    assert!(snapshot.viewport_resolved);
    assert_eq!(
        snapshot.viewport,
        Viewport::new(Coordinates::new(39.8283, -98.5795), 4)
    );
}

#[tokio::test(start_paused = true)]
async fn test_located_viewport_uses_local_zoom() {
    let (handle, _task) = MapDriver::new(
        CourtsMapController::default(),
        Arc::new(ScriptedCourtsApi::new()),
        Arc::new(FixedGeolocation(Coordinates::new(40.0, -75.0))),
    )
    .spawn();

    sleep_ms(10).await;
    assert_eq!(
        handle.snapshot().viewport,
        Viewport::new(Coordinates::new(40.0, -75.0), 11)
    );
}

#[tokio::test(start_paused = true)]
async fn test_geolocation_timeout_falls_back() {
    let slow = DelayedGeolocation {
        delay: Duration::from_secs(60),
        outcome: Ok(Coordinates::new(40.0, -75.0)),
    };
    let (handle, _task) = MapDriver::new(
        CourtsMapController::default(),
        Arc::new(ScriptedCourtsApi::new()),
        Arc::new(slow),
    )
    .with_geolocation_timeout(Duration::from_secs(8))
    .spawn();

    sleep_ms(7_000).await;
    assert!(!handle.snapshot().viewport_resolved);

    sleep_ms(2_000).await;
    let snapshot = handle.snapshot();
    assert!(snapshot.viewport_resolved);
    assert_eq!(snapshot.viewport.zoom, 4);
}

#[tokio::test(start_paused = true)]
async fn test_recenter_before_position_wins() {
    let slow = DelayedGeolocation {
        delay: ms(500),
        outcome: Ok(Coordinates::new(40.0, -75.0)),
    };
    let (handle, _task) = MapDriver::new(
        CourtsMapController::default(),
        Arc::new(ScriptedCourtsApi::new()),
        Arc::new(slow),
    )
    .spawn();

    let target = Viewport::new(Coordinates::new(47.6, -122.3), 13);
    handle.send(UiEvent::Recenter(target));
    sleep_ms(1_000).await;
    assert_eq!(handle.snapshot().viewport, target);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_responses_keep_latest() {
    let api = ScriptedCourtsApi::new()
        .respond("", ms(5), vec![court("a", "Alpha", 40.0, -75.0)])
        .respond("slow", ms(300), vec![court("s", "Slow", 40.0, -75.0)])
        .respond("fast", ms(50), vec![court("f", "Fast", 40.0, -75.0)]);
    let (handle, _task) = driver(api).spawn();

    sleep_ms(10).await;
    assert_eq!(ids(&handle.snapshot().rows), vec!["a"]);

    handle.send(UiEvent::SetText("slow".into()));
    handle.send(UiEvent::SetText("fast".into()));

    sleep_ms(20).await;
    // Previous set stays visible while the query is in flight
    let pending = handle.snapshot();
    assert!(pending.loading);
    assert_eq!(ids(&pending.rows), vec!["a"]);

    sleep_ms(80).await;
    assert_eq!(ids(&handle.snapshot().rows), vec!["f"]);

    sleep_ms(400).await;
    let settled = handle.snapshot();
    assert_eq!(ids(&settled.rows), vec!["f"]);
    assert_eq!(settled.filters.text, "fast");
    assert!(!settled.loading);
}

#[tokio::test(start_paused = true)]
async fn test_failed_query_keeps_previous_rows() {
    let api = ScriptedCourtsApi::new()
        .respond("", ms(5), vec![court("a", "Alpha", 40.0, -75.0)])
        .fail("boom", ms(5), ClientError::http(502, "bad gateway"));
    let (handle, _task) = driver(api).spawn();

    sleep_ms(10).await;
    handle.send(UiEvent::SetText("boom".into()));
    sleep_ms(10).await;

    let snapshot = handle.snapshot();
    assert_eq!(ids(&snapshot.rows), vec!["a"]);
    assert!(snapshot.notice.is_some());

    handle.send(UiEvent::DismissNotice);
    sleep_ms(1).await;
    assert!(handle.snapshot().notice.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_hover_decay_through_driver() {
    let api = ScriptedCourtsApi::new().respond(
        "",
        ms(0),
        vec![court("a", "Alpha", 40.0, -75.0), court("b", "Bravo", 41.0, -74.0)],
    );
    let (handle, _task) = driver(api).spawn();

    handle.send(UiEvent::RowHover(CourtId::new("a")));
    sleep_ms(500).await;
    handle.send(UiEvent::RowHover(CourtId::new("b")));

    sleep_ms(750).await; // t = 1250
    assert_eq!(handle.snapshot().hovered, Some(CourtId::new("b")));

    sleep_ms(500).await; // t = 1750
    assert_eq!(handle.snapshot().hovered, None);
}

#[tokio::test(start_paused = true)]
async fn test_pin_click_scrolls_and_accents() {
    let api = ScriptedCourtsApi::new().respond(
        "",
        ms(0),
        vec![court("a", "Alpha", 40.0, -75.0), court("b", "Bravo", 41.0, -74.0)],
    );
    let (mut handle, _task) = driver(api).spawn();
    sleep_ms(1).await;

    handle.send(UiEvent::PinClick(CourtId::new("b")));
    sleep_ms(100).await;
    assert_eq!(handle.try_next_scroll(), Some(CourtId::new("b")));

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.active, Some(CourtId::new("b")));
    let row = snapshot.rows.iter().find(|r| r.id.as_str() == "b").unwrap();
    assert!(row.accented && row.active);

    sleep_ms(900).await;
    let snapshot = handle.snapshot();
    let row = snapshot.rows.iter().find(|r| r.id.as_str() == "b").unwrap();
    assert!(!row.accented);
    assert!(row.active);

    // Not in the list, so nothing to scroll to
    handle.send(UiEvent::PinClick(CourtId::new("zzz")));
    sleep_ms(1).await;
    assert_eq!(handle.try_next_scroll(), None);
    assert_eq!(handle.snapshot().active, Some(CourtId::new("zzz")));
}

#[tokio::test(start_paused = true)]
async fn test_view_mode_toggle_preserves_state() {
    let api = ScriptedCourtsApi::new().respond("", ms(0), vec![court("a", "Alpha", 40.0, -75.0)]);
    let (handle, _task) = driver(api).spawn();
    sleep_ms(1).await;
    handle.send(UiEvent::PinClick(CourtId::new("a")));
    sleep_ms(1).await;
    let before = handle.snapshot();

    handle.send(UiEvent::SetViewMode(ViewMode::ListOnly));
    sleep_ms(1).await;
    let list = handle.snapshot();
    assert!(list.markers.is_empty());
    assert_eq!(list.rows, before.rows);
    assert_eq!(list.filters, before.filters);
    assert_eq!(list.viewport, before.viewport);
    assert_eq!(list.active, before.active);

    handle.send(UiEvent::ToggleViewMode);
    sleep_ms(1).await;
    assert_eq!(handle.snapshot().markers, before.markers);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_drops_late_results() {
    let api = ScriptedCourtsApi::new().respond("", ms(300), vec![court("a", "Alpha", 40.0, -75.0)]);
    let (handle, task) = driver(api).spawn();

    handle.send(UiEvent::Unmount);
    let controller = task.await.unwrap();
    assert!(!controller.is_mounted());
    assert!(controller.results().is_empty());
    assert!(!handle.send(UiEvent::Refresh));

    // The in-flight fetch finishes into a closed channel
    sleep_ms(500).await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_driver() {
    let (handle, task) = driver(ScriptedCourtsApi::new()).spawn();
    drop(handle);
    let controller = task.await.unwrap();
    assert!(!controller.is_mounted());
}

#[tokio::test(start_paused = true)]
async fn test_session_bearer_sent_with_fetches() {
    let api = ScriptedCourtsApi::new();
    let api = Arc::new(api);
    let session = SessionContext::init(Arc::new(MemoryTokenStore::with_token("tok"))).unwrap();
    let (handle, _task) = MapDriver::new(
        CourtsMapController::default(),
        api.clone(),
        Arc::new(DeniedGeolocation),
    )
    .with_session(&session)
    .spawn();

    handle.send(UiEvent::Refresh);
    sleep_ms(10).await;
    assert_eq!(api.bearers(), vec![Some("tok".to_string()); 2]);
}

#[tokio::test(start_paused = true)]
async fn test_local_backend_rejects_missing_token() {
    let api = LocalCourtsApi::with_courts([court("a", "Alpha", 40.0, -75.0)]);
    api.require_token("tok");
    let (handle, _task) = MapDriver::new(
        CourtsMapController::default(),
        Arc::new(api),
        Arc::new(DeniedGeolocation),
    )
    .spawn();

    sleep_ms(10).await;
    let snapshot = handle.snapshot();
    assert!(snapshot.rows.is_empty());
    assert!(snapshot
        .notice
        .map(|n| n.message.contains("401"))
        .unwrap_or(false));
}

#[tokio::test(start_paused = true)]
async fn test_denied_geolocation_is_not_an_error() {
    let denied = DelayedGeolocation {
        delay: ms(5),
        outcome: Err(GeolocationError::PermissionDenied),
    };
    let (handle, _task) = MapDriver::new(
        CourtsMapController::default(),
        Arc::new(ScriptedCourtsApi::new()),
        Arc::new(denied),
    )
    .spawn();

    sleep_ms(10).await;
    let snapshot = handle.snapshot();
    assert!(snapshot.notice.is_none());
    assert_eq!(snapshot.viewport.zoom, 4);
}
