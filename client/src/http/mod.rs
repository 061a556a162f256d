//! Backend access for the courts listing.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  CourtsMapController (services::map_view)                 │
//! │  - emits FetchCourts(ticket) effects                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  CourtsApi trait                                          │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │ HttpCourtsApi │ LocalCourtsApi│
//!     │  (reqwest)    │  (in-memory)  │
//!     └──────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::Court;
use crate::services::QueryDescriptor;

#[cfg(feature = "http-client")]
pub mod client;
pub mod local;

#[cfg(feature = "http-client")]
pub use client::{BackendClient, HttpCourtsApi};
pub use local::LocalCourtsApi;

/// Path of the listing endpoint.
pub const COURTS_PATH: &str = "/courts";

/// Listing endpoint contract.
///
/// Implementations return courts in backend order and report any non-success
/// status as an error.
#[async_trait]
pub trait CourtsApi: Send + Sync {
    async fn list_courts(
        &self,
        query: &QueryDescriptor,
        bearer: Option<&str>,
    ) -> ClientResult<Vec<Court>>;
}
