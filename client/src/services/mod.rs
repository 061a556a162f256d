//! View logic for the Courts Map.
//!
//! Everything in this module is synchronous and clock-free: time comes in as
//! view-relative `Duration`s and asynchronous work goes out as effects. The
//! [`crate::runtime`] driver is what connects it to real I/O.

pub mod geolocation;
pub mod map_view;
pub mod query;
pub mod result_set;
pub mod selection;
pub mod view_mode;



pub use geolocation::{
    acquire_position, DeniedGeolocation, FixedGeolocation, GeolocationError,
    GeolocationProvider, GeolocationRequest, GeolocationResolver, MountId,
    UnavailableGeolocation, ViewportPolicy, ViewportSource,
};
pub use map_view::{
    ApplyOutcome, CourtsMapController, MapSnapshot, MarkerStyle, MarkerView, Notice, NoticeKind,
    RowView, ViewEffect,
};
pub use query::{build_query, QueryDescriptor, QuerySeq, QueryTicket, QueryTracker};
pub use result_set::CourtResultSet;
pub use selection::{PinClickOutcome, SelectionCoordinator, SelectionState, SelectionTimings};
pub use view_mode::ViewMode;
