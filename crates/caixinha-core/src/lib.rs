//! Core library for Caixinha, a personal finance tracker.
//!
//! - `api`: request gateway with transparent token refresh, typed endpoints
//! - `auth`: token store, storage backends, session operations
//! - `models`: users, categories, transactions, monthly summary
//! - `config`: API location and storage backend selection
//! - `utils`: amount and date helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiRequest, Gateway};
pub use auth::{Session, TokenStore};
pub use config::Config;
