use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::TokenStore;
use crate::api::{ApiError, ApiRequest, Gateway};
use crate::models::{LoginRequest, RegisterRequest, User};

/// Where unauthenticated visitors are sent
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh: &'a str,
}

#[derive(Serialize)]
struct PasswordResetRequest<'a> {
    login: &'a str,
}

#[derive(Serialize)]
struct PasswordResetConfirm<'a> {
    new_password: &'a str,
    new_password2: &'a str,
}

/// Outcome of a route guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect { to: &'static str, from: String },
}

/// Login state on top of the gateway. Token refresh stays in the gateway;
/// the session only stores what login hands back and clears it on logout.
#[derive(Clone)]
pub struct Session {
    gateway: Gateway,
}

impl Session {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        self.gateway.store()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().is_authenticated()
    }

    /// Route guard: authenticated users pass, everybody else goes to the
    /// login page remembering where they came from.
    pub fn guard(&self, path: &str) -> Navigation {
        if self.is_authenticated() {
            Navigation::Allow
        } else {
            Navigation::Redirect {
                to: LOGIN_ROUTE,
                from: path.to_string(),
            }
        }
    }

    /// Log in and store the returned tokens in place of any previous session
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, ApiError> {
        let request = ApiRequest::post("/auth/login/").anonymous().json(credentials)?;
        let response: LoginResponse = self.gateway.send_json(request).await?;

        // The new pair replaces the previous one entirely, absent fields included
        let store = self.store();
        store.set_access(response.access.as_deref());
        store.set_refresh(response.refresh.as_deref());

        let user = match response.user {
            Some(user) => user,
            None => self.current_user().await.ok_or_else(|| {
                ApiError::InvalidResponse("Login succeeded but no user was returned".to_string())
            })?,
        };
        info!(user = %user.username, "Logged in");
        Ok(user)
    }

    /// Tell the API we're leaving, then forget the tokens no matter what it said
    pub async fn logout(&self) {
        let store = self.store();
        let request = match store.refresh() {
            Some(refresh) => ApiRequest::post("/auth/logout/").json(&LogoutRequest { refresh: &refresh }),
            None => Ok(ApiRequest::post("/auth/logout/")),
        };

        let result = match request {
            Ok(request) => self.gateway.send_empty(request).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }

        store.clear();
        info!("Logged out");
    }

    /// The logged in user, or `None` when the API won't say who we are
    pub async fn current_user(&self) -> Option<User> {
        match self.gateway.send_json::<User>(ApiRequest::get("/auth/me/")).await {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "No current user");
                None
            }
        }
    }

    pub async fn register(&self, account: &RegisterRequest) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/register/").anonymous().json(account)?;
        self.gateway.send_empty(request).await
    }

    /// Ask the API to email a reset link. `login` is an email or username.
    pub async fn request_password_reset(&self, login: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post("/auth/password-reset/")
            .anonymous()
            .json(&PasswordResetRequest { login })?;
        self.gateway.send_empty(request).await
    }

    /// Set a new password using the uid/token pair from the reset link
    pub async fn confirm_password_reset(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
        new_password2: &str,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(format!("/auth/password-reset/{}/{}/", uid, token))
            .anonymous()
            .json(&PasswordResetConfirm {
                new_password,
                new_password2,
            })?;
        self.gateway.send_empty(request).await
    }
}
