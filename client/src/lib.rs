//! # Court Finder client core
//!
//! Client-side logic of the Court Finder "Courts Map" view: the filterable,
//! map-backed listing of pickleball courts.
//!
//! ## Architecture
//!
//! - [`models`]: courts, filter sets and geographic types
//! - [`services`]: the synchronous view logic. Geolocation resolution, query
//!   building with stale-response guards, the result set, selection and
//!   highlight decay, and the view-mode switch, composed by
//!   [`services::CourtsMapController`]
//! - [`http`]: the `GET /courts` contract, with a reqwest client and an
//!   in-memory backend
//! - [`session`]: bearer token, profile and the auth endpoints
//! - [`runtime`]: the tokio driver that runs the controller against real I/O
//! - [`config`] and [`error`]: configuration loading and the error type
//!
//! ## Features
//!
//! - `http-client` (default): reqwest implementation of the backend endpoints
//! - `cli` (default): the `courts-map` binary

// ClientError carries a full ErrorContext in every variant
#![allow(clippy::result_large_err)]

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod runtime;
pub mod services;
pub mod session;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorContext};
pub use runtime::{MapDriver, MapHandle, UiEvent};
pub use services::CourtsMapController;
