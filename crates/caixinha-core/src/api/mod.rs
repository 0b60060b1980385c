//! REST API client module for the Caixinha backend.
//!
//! `Gateway` sends every request with the current bearer token and
//! transparently refreshes it when the API reports it expired.
//! `ApiClient` exposes the typed finance endpoints on top of it.

pub mod client;
pub mod error;
pub mod gateway;
pub mod request;

pub use client::{ApiClient, DEFAULT_RECENT_LIMIT};
pub use error::{ApiError, AuthErrorBody, TokenMessage};
pub use gateway::{Gateway, DEFAULT_TIMEOUT_SECS};
pub use request::{ApiRequest, RequestState};
