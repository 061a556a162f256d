//! Selection and highlight coordination between map markers and list rows.
//!
//! The coordinator owns three pieces of transient state:
//!
//! - `active`: the court whose marker was clicked last (the scroll target)
//! - `hovered`: the court whose list row is being hovered, with an expiry
//! - `accent`: the list row briefly accented after a marker click
//!
//! Hover and accent decay through timers. A timer never cancels anything: when
//! it fires it clears its slot only if the slot still holds the generation the
//! timer was armed for. A superseded timer therefore fires as a no-op, whatever
//! order timers happen to fire in.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::debug;

use crate::config::SelectionSettings;
use crate::models::CourtId;

/// Decay windows for hover and accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTimings {
    pub hover_window: Duration,
    pub accent_window: Duration,
}

impl Default for SelectionTimings {
    fn default() -> Self {
        Self {
            hover_window: Duration::from_millis(1200),
            accent_window: Duration::from_millis(900),
        }
    }
}

impl From<&SelectionSettings> for SelectionTimings {
    fn from(settings: &SelectionSettings) -> Self {
        Self {
            hover_window: settings.hover_window(),
            accent_window: settings.accent_window(),
        }
    }
}

/// Time-bounded highlight on one court.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedHighlight {
    pub id: CourtId,
    pub expires_at: Duration,
    pub generation: u64,
}

/// Selection visible to both renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub active: Option<CourtId>,
    pub hovered: Option<TimedHighlight>,
}

/// What a marker click did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinClickOutcome {
    /// The row was scrolled into view and accented.
    Scrolled,
    /// The row is not mounted; only the active selection changed.
    TargetNotMounted,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DecayKind {
    Hover,
    Accent,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DecayTimer {
    due: Duration,
    // generations only grow, so equal deadlines fire in arming order
    generation: u64,
    kind: DecayKind,
}

/// State machine behind the `pin-click` and `row-hover` transitions.
#[derive(Debug, Clone)]
pub struct SelectionCoordinator {
    timings: SelectionTimings,
    state: SelectionState,
    accent: Option<TimedHighlight>,
    timers: BinaryHeap<Reverse<DecayTimer>>,
    next_generation: u64,
}

impl SelectionCoordinator {
    pub fn new(timings: SelectionTimings) -> Self {
        Self {
            timings,
            state: SelectionState::default(),
            accent: None,
            timers: BinaryHeap::new(),
            next_generation: 1,
        }
    }

    pub fn timings(&self) -> SelectionTimings {
        self.timings
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn active(&self) -> Option<&CourtId> {
        self.state.active.as_ref()
    }

    pub fn hovered(&self) -> Option<&CourtId> {
        self.state.hovered.as_ref().map(|h| &h.id)
    }

    /// Row currently carrying the click accent.
    pub fn accented(&self) -> Option<&CourtId> {
        self.accent.as_ref().map(|a| &a.id)
    }

    /// Rendering rule: a marker is emphasized iff it is the hovered court.
    pub fn is_emphasized(&self, id: &CourtId) -> bool {
        self.hovered() == Some(id)
    }

    /// Earliest pending timer deadline, stale timers included.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.peek().map(|Reverse(t)| t.due)
    }

    /// Marker clicked: make `id` active and, if its row is mounted, accent it.
    ///
    /// A pending accent on another row is removed immediately; its timer
    /// becomes a no-op. If the row is not mounted nothing is scrolled or
    /// accented, and any existing accent runs out on its own.
    pub fn pin_click(&mut self, id: CourtId, row_mounted: bool, now: Duration) -> PinClickOutcome {
        self.state.active = Some(id.clone());

        if !row_mounted {
            debug!(court = %id, "pin click without mounted row");
            return PinClickOutcome::TargetNotMounted;
        }

        let generation = self.bump_generation();
        let expires_at = now + self.timings.accent_window;
        if let Some(previous) = self.accent.replace(TimedHighlight {
            id: id.clone(),
            expires_at,
            generation,
        }) {
            if previous.id != id {
                debug!(court = %previous.id, "accent superseded");
            }
        }
        self.arm(DecayKind::Accent, expires_at, generation);
        debug!(court = %id, ?expires_at, "accent applied");
        PinClickOutcome::Scrolled
    }

    /// List row hovered: highlight `id` until the hover window runs out.
    pub fn row_hover(&mut self, id: CourtId, now: Duration) {
        let generation = self.bump_generation();
        let expires_at = now + self.timings.hover_window;
        debug!(court = %id, ?expires_at, "hover");
        self.state.hovered = Some(TimedHighlight {
            id,
            expires_at,
            generation,
        });
        self.arm(DecayKind::Hover, expires_at, generation);
    }

    /// Fire every timer due at or before `now`. Returns `true` if any visible
    /// state changed.
    pub fn advance(&mut self, now: Duration) -> bool {
        let mut changed = false;
        while let Some(Reverse(timer)) = self.timers.peek() {
            if timer.due > now {
                break;
            }
            let Some(Reverse(timer)) = self.timers.pop() else {
                break;
            };
            changed |= self.fire(&timer);
        }
        changed
    }

    /// Drop highlights whose court is no longer listed.
    pub fn retain_listed(&mut self, is_listed: impl Fn(&CourtId) -> bool) -> bool {
        let mut changed = false;
        if self.state.active.as_ref().is_some_and(|id| !is_listed(id)) {
            self.state.active = None;
            changed = true;
        }
        if self.state.hovered.as_ref().is_some_and(|h| !is_listed(&h.id)) {
            self.state.hovered = None;
            changed = true;
        }
        if self.accent.as_ref().is_some_and(|a| !is_listed(&a.id)) {
            self.accent = None;
            changed = true;
        }
        changed
    }

    /// Leaving the view: forget the selection and every pending timer.
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
        self.accent = None;
        self.timers.clear();
    }

    fn fire(&mut self, timer: &DecayTimer) -> bool {
        let slot = match timer.kind {
            DecayKind::Hover => &mut self.state.hovered,
            DecayKind::Accent => &mut self.accent,
        };
        if !slot.as_ref().is_some_and(|c| c.generation == timer.generation) {
            return false;
        }
        if let Some(expired) = slot.take() {
            debug!(court = %expired.id, kind = ?timer.kind, "highlight expired");
        }
        true
    }

    fn arm(&mut self, kind: DecayKind, due: Duration, generation: u64) {
        self.timers.push(Reverse(DecayTimer {
            due,
            generation,
            kind,
        }));
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new(SelectionTimings::default())
    }
}
