#![allow(dead_code)]

use std::sync::Arc;

use caixinha_core::api::Gateway;
use caixinha_core::auth::TokenStore;
use serde_json::{json, Value};
use wiremock::{Match, MockServer, Request};

/// Body the API sends when the access token has expired
pub fn expired_body() -> Value {
    json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid",
        "messages": [{
            "token_class": "AccessToken",
            "token_type": "access",
            "message": "Token is expired"
        }]
    })
}

/// Same code, but the token is malformed rather than expired
pub fn invalid_body() -> Value {
    json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid",
        "messages": [{
            "token_class": "AccessToken",
            "token_type": "access",
            "message": "Token is invalid"
        }]
    })
}

pub fn store_with(access: Option<&str>, refresh: Option<&str>) -> Arc<TokenStore> {
    let store = TokenStore::in_memory();
    store.set_access(access);
    store.set_refresh(refresh);
    Arc::new(store)
}

pub async fn setup(access: Option<&str>, refresh: Option<&str>) -> (MockServer, Gateway) {
    let server = MockServer::start().await;
    let gateway = Gateway::with_client(reqwest::Client::new(), server.uri(), store_with(access, refresh));
    (server, gateway)
}

/// Matches requests sent without an Authorization header
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}
