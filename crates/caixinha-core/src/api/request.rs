use reqwest::Method;
use serde::Serialize;

/// Where a request is in its lifecycle.
///
/// `Retried` is terminal for refresh purposes: a request in that state is
/// never sent into another refresh cycle, which bounds replays to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    AwaitingRefresh,
    Retried,
    Done,
}

/// Everything needed to issue (and re-issue) a call to the API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    authenticated: bool,
    state: RequestState,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            state: RequestState::Pending,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body. Serialization errors surface here rather than at
    /// send time so that a replay sends exactly the same bytes.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without the bearer token (login, registration, password reset)
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Move into `AwaitingRefresh` after an expiry failure.
    /// Returns false when the request was already replayed once.
    pub(crate) fn begin_refresh(&mut self) -> bool {
        match self.state {
            RequestState::Pending => {
                self.state = RequestState::AwaitingRefresh;
                true
            }
            RequestState::AwaitingRefresh | RequestState::Retried | RequestState::Done => false,
        }
    }

    /// Refresh produced a new token; the next send is the only replay.
    pub(crate) fn mark_retried(&mut self) {
        debug_assert_eq!(self.state, RequestState::AwaitingRefresh);
        self.state = RequestState::Retried;
    }

    pub(crate) fn mark_done(&mut self) {
        self.state = RequestState::Done;
    }
}
