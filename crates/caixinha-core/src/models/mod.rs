//! Data models for the Caixinha API.
//!
//! - `User`, `LoginRequest`, `RegisterRequest`: account types
//! - `Category`, `NewCategory`: spending categories
//! - `Transaction`, `NewTransaction`, `TransactionFilter`, `Totals`
//! - `Summary`: monthly dashboard figures

pub mod category;
pub mod summary;
pub mod transaction;
pub mod user;

use serde::Deserialize;

pub use category::{Category, NewCategory, MIN_CATEGORY_NAME_LEN};
pub use summary::{CategoryTotal, Summary, UNCATEGORIZED};
pub use transaction::{NewTransaction, Totals, Transaction, TransactionFilter, TxType};
pub use user::{LoginRequest, RegisterRequest, User, UserId};

/// List endpoints answer with either a bare array or a paginated page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Page { results: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Plain(items) => items,
            Listing::Page { results } => results,
        }
    }
}
