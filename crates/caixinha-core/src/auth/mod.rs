//! Authentication module for credential storage and sessions.
//!
//! This module provides:
//! - `TokenStore`: owner of the access/refresh token pair
//! - `TokenStorage` backends: OS keychain, JSON file, memory
//! - `Session`: login, logout, current user and account operations
//!
//! Token refresh itself lives in the API gateway.

pub mod session;
pub mod storage;
pub mod token_store;

pub use session::{Navigation, Session, LOGIN_ROUTE};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, TokenStorage};
pub use token_store::{Credentials, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
