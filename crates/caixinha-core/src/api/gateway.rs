//! Authenticated request gateway.
//!
//! Every call to the API goes through [`Gateway::send`]. The gateway
//! attaches the store's current bearer token, recognises the API's
//! "token expired" failure, refreshes the access token at most once per
//! burst of concurrent failures, and replays the failed request with the
//! new token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ApiError, ApiRequest};
use crate::auth::TokenStore;

/// Endpoint that trades a refresh token for a new access token
const REFRESH_PATH: &str = "/auth/refresh/";

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Result of a refresh shared by every request waiting on it.
/// `None` means the refresh failed and the store has been cleared.
type RefreshResult = Shared<BoxFuture<'static, Option<String>>>;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

struct InFlightRefresh {
    id: u64,
    result: RefreshResult,
}

struct Inner {
    client: Client,
    base_url: String,
    store: Arc<TokenStore>,
    in_flight: Mutex<Option<InFlightRefresh>>,
    attempts: AtomicU64,
}

impl Inner {
    fn in_flight(&self) -> MutexGuard<'_, Option<InFlightRefresh>> {
        // The slot only ever holds a complete value, so a poisoned lock is still usable
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears the in-flight slot when the refresh task ends, however it ends.
struct ReleaseOnDrop {
    inner: Arc<Inner>,
    id: u64,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        let mut slot = self.inner.in_flight();
        if slot.as_ref().is_some_and(|r| r.id == self.id) {
            *slot = None;
        }
    }
}

/// HTTP gateway to the Caixinha API.
/// Clone is cheap - clones share the connection pool, the token store and
/// the in-flight refresh.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

impl Gateway {
    /// Create a gateway with the default request timeout
    pub fn new(base_url: impl Into<String>, store: Arc<TokenStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, store, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        store: Arc<TokenStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, store))
    }

    /// Create a gateway around an existing client, sharing its pool
    pub fn with_client(client: Client, base_url: impl Into<String>, store: Arc<TokenStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                store,
                in_flight: Mutex::new(None),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// True while a refresh is outstanding
    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight().is_some()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    /// Send a request, refreshing the access token and replaying once if the
    /// API reports it expired.
    ///
    /// Failures other than an expired token are returned untouched. When the
    /// refresh fails the store is cleared and the request's own failure is
    /// returned, not the refresh failure.
    pub async fn send(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        let failure = match self.dispatch(&request).await {
            Ok(response) => {
                request.mark_done();
                return Ok(response);
            }
            Err(e) => e,
        };

        if !failure.is_token_expired() || !request.begin_refresh() {
            return Err(failure);
        }

        let store = &self.inner.store;
        if store.refresh().is_none() {
            warn!(path = request.path(), "Access token expired without a refresh token, logging out");
            store.clear();
            return Err(failure);
        }

        if self.refreshed_access().await.is_none() {
            return Err(failure);
        }

        request.mark_retried();
        debug!(method = %request.method(), path = request.path(), "Replaying request with refreshed token");
        let result = self.dispatch(&request).await;
        request.mark_done();
        result
    }

    /// Send and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path().to_string();
        let response = self.send(request).await?;
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    /// Send and ignore the response body (DELETE, logout, ...)
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.url(request.path());
        debug!(method = %request.method(), url = %url, state = ?request.state(), "Sending request");

        let mut builder = self
            .inner
            .client
            .request(request.method().clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if request.is_authenticated() {
            if let Some(authorization) = self.inner.store.authorization() {
                builder = builder.header(header::AUTHORIZATION, authorization);
            }
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        check_response(response).await
    }

    /// Await the in-flight refresh, starting one if none is outstanding.
    ///
    /// The check and the insert happen under one lock, so concurrent callers
    /// that find the slot empty cannot both start a refresh.
    async fn refreshed_access(&self) -> Option<String> {
        let result = {
            let mut slot = self.inner.in_flight();
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!(attempt = in_flight.id, "Waiting on in-flight token refresh");
                    in_flight.result.clone()
                }
                None => {
                    let id = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    let result = self.spawn_refresh(id);
                    *slot = Some(InFlightRefresh {
                        id,
                        result: result.clone(),
                    });
                    result
                }
            }
        };
        result.await
    }

    /// Run the refresh as its own task so that callers giving up on their
    /// request don't cancel it for everybody else.
    fn spawn_refresh(&self, id: u64) -> RefreshResult {
        let gateway = self.clone();
        let task = tokio::spawn(async move {
            let _release = ReleaseOnDrop {
                inner: Arc::clone(&gateway.inner),
                id,
            };
            gateway.refresh_tokens(id).await
        });

        async move {
            task.await.unwrap_or_else(|e| {
                warn!(attempt = id, error = %e, "Token refresh task did not complete");
                None
            })
        }
        .boxed()
        .shared()
    }

    async fn refresh_tokens(&self, attempt: u64) -> Option<String> {
        let store = &self.inner.store;
        let Some(refresh) = store.refresh() else {
            store.clear();
            return None;
        };

        info!(attempt, "Access token expired, refreshing");
        match self.request_refresh(&refresh).await {
            Ok(tokens) => {
                store.set_access(Some(&tokens.access));
                // Without rotation the old refresh token stays valid
                if let Some(rotated) = tokens.refresh.as_deref() {
                    store.set_refresh(Some(rotated));
                }
                info!(attempt, rotated = tokens.refresh.is_some(), "Access token refreshed");
                Some(tokens.access)
            }
            Err(e) => {
                warn!(attempt, error = %e, "Token refresh failed, logging out");
                store.clear();
                None
            }
        }
    }

    async fn request_refresh(&self, refresh: &str) -> Result<RefreshResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(REFRESH_PATH))
            .header(header::ACCEPT, "application/json")
            .json(&RefreshRequest { refresh })
            .send()
            .await?;

        let response = check_response(response).await?;
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e))
        })
    }
}

/// Check if response is successful, returning an error with body if not.
async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}
