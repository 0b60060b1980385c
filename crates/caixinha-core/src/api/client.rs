//! Typed finance endpoints on top of the gateway.

use tracing::debug;

use super::{ApiError, ApiRequest, Gateway};
use crate::models::{
    Category, Listing, NewCategory, NewTransaction, Summary, Transaction, TransactionFilter,
    MIN_CATEGORY_NAME_LEN,
};

/// Number of transactions shown on the dashboard
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// API client for the Caixinha backend.
/// Clone is cheap - the gateway is shared.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Gateway,
}

impl ApiClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    // ===== Dashboard =====

    /// Monthly totals for a YYYY-MM month
    pub async fn summary(&self, month: &str) -> Result<Summary, ApiError> {
        self.gateway
            .send_json(ApiRequest::get("/summary/").query("month", month))
            .await
    }

    pub async fn recent_transactions(
        &self,
        month: &str,
        limit: u32,
    ) -> Result<Vec<Transaction>, ApiError> {
        let listing: Listing<Transaction> = self
            .gateway
            .send_json(
                ApiRequest::get("/transactions/recent/")
                    .query("limit", limit)
                    .query("month", month),
            )
            .await?;
        Ok(listing.into_vec())
    }

    // ===== Categories =====

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let listing: Listing<Category> =
            self.gateway.send_json(ApiRequest::get("/categories/")).await?;
        Ok(listing.into_vec())
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        let category = NewCategory::new(name).ok_or_else(|| {
            ApiError::Validation(format!(
                "Category name must have at least {} characters",
                MIN_CATEGORY_NAME_LEN
            ))
        })?;
        debug!(name = %category.name, "Creating category");
        self.gateway
            .send_json(ApiRequest::post("/categories/").json(&category)?)
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::delete(format!("/categories/{}/", id)))
            .await
    }

    // ===== Transactions =====

    pub async fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, ApiError> {
        let request = filter
            .query_pairs()
            .into_iter()
            .fold(ApiRequest::get("/transactions/"), |req, (key, value)| req.query(key, value));
        let listing: Listing<Transaction> = self.gateway.send_json(request).await?;
        Ok(listing.into_vec())
    }

    pub async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction, ApiError> {
        debug!(tx_type = %tx.tx_type, date = %tx.date, "Creating transaction");
        self.gateway
            .send_json(ApiRequest::post("/transactions/").json(tx)?)
            .await
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::delete(format!("/transactions/{}/", id)))
            .await
    }
}
