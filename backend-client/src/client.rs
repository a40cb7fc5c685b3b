use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;
use estate_login::Role;
use estate_login::SessionStore;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::cookie::CookieStore as _;
use reqwest::cookie::Jar;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::trace;
use tracing::warn;
use url::Url;

use crate::error::ApiError;
use crate::error::Result;
use crate::events::AuthEvent;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";
const REFRESH_COOKIE_NAME: &str = "refreshToken";
const DEFAULT_USER_AGENT: &str = "estate-client";
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// How 401s that arrive while a renewal is already underway are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenewalPolicy {
    /// Concurrent 401s share one renewal call and its outcome.
    #[default]
    Coalesce,
    /// Every 401 issues its own renewal call.
    PerRequest,
}

/// Per-call additions to a request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    skip_renewal: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied after the defaults, so it wins over `Content-Type` and
    /// `Authorization` too.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Return a 401 as-is instead of renewing the session. Used by the auth
    /// endpoints themselves.
    pub fn without_renewal(mut self) -> Self {
        self.skip_renewal = true;
        self
    }
}

/// A resolved 2xx response with its body already read.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    url: String,
}

impl ApiResponse {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| ApiError::Decode {
            url: self.url.clone(),
            body: self.text(),
            source,
        })
    }

    /// Like [`ApiResponse::json`] but an empty body decodes to `null`.
    pub fn json_value(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        self.json()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport settings fixed when the underlying HTTP client is built.
#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
    /// Overall per-request timeout. Unset means the transport default.
    pub timeout: Option<Duration>,
    /// Jar holding the refresh cookie. A fresh jar is created when unset.
    pub cookie_jar: Option<Arc<Jar>>,
}

#[derive(Debug, Clone)]
enum RenewalOutcome {
    Renewed(String),
    Failed,
}

#[derive(Debug, Default)]
struct RenewalGate {
    /// Bumped after every coalesced renewal completes. Only written while
    /// `last_outcome` is locked.
    epoch: AtomicU64,
    last_outcome: Mutex<Option<RenewalOutcome>>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default, deserialize_with = "crate::types::de::known_role")]
    role: Option<Role>,
}

/// Access layer for the marketplace API.
///
/// Attaches the stored credential to every call and, on a 401, renews the
/// session once through the refresh cookie before retrying the call once.
#[derive(Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    session: Arc<dyn SessionStore>,
    cookie_jar: Arc<Jar>,
    user_agent: HeaderValue,
    extra_headers: HeaderMap,
    renewal_policy: RenewalPolicy,
    renewal: Arc<RenewalGate>,
    events: broadcast::Sender<AuthEvent>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("renewal_policy", &self.renewal_policy)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_options(base_url, session, ClientOptions::default())
    }

    pub fn with_options(
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
        options: ClientOptions,
    ) -> Result<Self> {
        let mut base_url = base_url.into();
        // Trim trailing slashes so paths can always start with one.
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let cookie_jar = options.cookie_jar.unwrap_or_default();
        let mut builder = reqwest::Client::builder().cookie_provider(Arc::clone(&cookie_jar));
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            base_url,
            http,
            session,
            cookie_jar,
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
            extra_headers: HeaderMap::new(),
            renewal_policy: RenewalPolicy::default(),
            renewal: Arc::new(RenewalGate::default()),
            events,
        })
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        if let Ok(hv) = HeaderValue::from_str(&ua.into()) {
            self.user_agent = hv;
        }
        self
    }

    /// Static headers sent with every call. Entries that are not valid
    /// header names or values are skipped.
    pub fn with_http_headers(mut self, headers: &HashMap<String, String>) -> Self {
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    self.extra_headers.insert(name, value);
                }
                _ => warn!("ignoring invalid http header {name:?}"),
            }
        }
        self
    }

    pub fn with_renewal_policy(mut self, policy: RenewalPolicy) -> Self {
        self.renewal_policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn renewal_policy(&self) -> RenewalPolicy {
        self.renewal_policy
    }

    /// Receive [`AuthEvent`]s emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn refresh_url(&self) -> Option<Url> {
        Url::parse(&self.url_for(REFRESH_PATH)).ok()
    }

    /// `Cookie:` header value the jar would send to the renewal endpoint.
    pub fn refresh_cookies(&self) -> Option<String> {
        let url = self.refresh_url()?;
        self.cookie_jar
            .cookies(&url)
            .and_then(|hv| hv.to_str().ok().map(str::to_string))
    }

    /// Seed the jar with `name=value` pairs captured by an earlier process.
    pub fn restore_cookies(&self, pairs: &[String]) {
        let Some(url) = self.refresh_url() else {
            return;
        };
        for pair in pairs {
            self.cookie_jar
                .add_cookie_str(&format!("{pair}; Path=/"), &url);
        }
    }

    pub(crate) fn expire_refresh_cookie(&self) {
        let Some(url) = self.refresh_url() else {
            return;
        };
        self.cookie_jar
            .add_cookie_str(&format!("{REFRESH_COOKIE_NAME}=; Max-Age=0; Path=/"), &url);
        // Also drop a copy scoped to the endpoint's default path.
        self.cookie_jar
            .add_cookie_str(&format!("{REFRESH_COOKIE_NAME}=; Max-Age=0"), &url);
    }

    fn headers(&self, credential: Option<&str>, overrides: &HeaderMap) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(USER_AGENT, self.user_agent.clone());
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.extra_headers {
            h.insert(name.clone(), value.clone());
        }
        if let Some(token) = credential {
            let value = format!("Bearer {token}");
            match HeaderValue::from_str(&value) {
                Ok(hv) => {
                    h.insert(AUTHORIZATION, hv);
                }
                Err(_) => warn!("stored credential is not a valid header value; sending without it"),
            }
        }
        for (name, value) in overrides {
            h.insert(name.clone(), value.clone());
        }
        h
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Bytes>,
        options: &RequestOptions,
        credential: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut req = self
            .http
            .request(method.clone(), url)
            .headers(self.headers(credential, &options.headers));
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = body {
            req = req.body(body.clone());
        }
        trace!(
            "{method} {url} (authorized: {})",
            credential.is_some()
        );
        Ok(req.send().await?)
    }

    /// Perform a call against `path` relative to the base URL.
    ///
    /// 2xx resolves; any other status rejects with [`ApiError::Status`]
    /// carrying the response verbatim. A 401 first triggers one session
    /// renewal and one retry; if renewal fails the session is cleared and
    /// [`ApiError::Unauthenticated`] is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.url_for(path);
        let body = body
            .map(|v| serde_json::to_vec(&v).map(Bytes::from))
            .transpose()
            .map_err(ApiError::Encode)?;

        // Read the epoch before the credential so a renewal that lands in
        // between is noticed on 401.
        let observed_epoch = self.renewal.epoch.load(Ordering::Acquire);
        let credential = self.session.credential();
        let res = self
            .send_once(&method, &url, body.as_ref(), &options, credential.as_deref())
            .await?;

        if res.status() != StatusCode::UNAUTHORIZED || options.skip_renewal {
            return into_api_response(&method, &url, res).await;
        }

        debug!("{method} {url} returned 401; renewing session");
        let renewed = self.renew_after_unauthorized(observed_epoch).await?;
        let retry = self
            .send_once(&method, &url, body.as_ref(), &options, Some(&renewed))
            .await?;
        into_api_response(&method, &url, retry).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::GET, path, None, RequestOptions::default())
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.request(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.request(Method::PUT, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None, RequestOptions::default())
            .await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(Method::GET, path, None, options).await?.json()
    }

    async fn renew_after_unauthorized(&self, observed_epoch: u64) -> Result<String> {
        match self.renewal_policy {
            RenewalPolicy::PerRequest => self.renew_session().await,
            RenewalPolicy::Coalesce => {
                let mut last = self.renewal.last_outcome.lock().await;
                if self.renewal.epoch.load(Ordering::Acquire) != observed_epoch
                    && let Some(outcome) = last.as_ref()
                {
                    debug!("reusing a renewal that completed while the request was in flight");
                    return match outcome {
                        RenewalOutcome::Renewed(token) => Ok(token.clone()),
                        RenewalOutcome::Failed => Err(ApiError::Unauthenticated),
                    };
                }
                let result = self.renew_session().await;
                *last = Some(match &result {
                    Ok(token) => RenewalOutcome::Renewed(token.clone()),
                    Err(_) => RenewalOutcome::Failed,
                });
                self.renewal.epoch.fetch_add(1, Ordering::AcqRel);
                result
            }
        }
    }

    /// Exchange the refresh cookie for a new credential and store it. On any
    /// failure the session is cleared and `Unauthenticated` is returned.
    pub(crate) async fn renew_session(&self) -> Result<String> {
        let renewed = match self.call_refresh_endpoint().await {
            Ok(RefreshResponse { access_token, role }) => {
                let stored = match role {
                    Some(role) => self.session.set_session(access_token.clone(), Some(role)),
                    None => self.session.update_credential(access_token.clone()),
                };
                stored
                    .map(|()| access_token)
                    .map_err(ApiError::Session)
            }
            Err(err) => Err(err),
        };
        // A credential that could not be stored is as unusable as a rejected
        // renewal; every caller sees the same outcome.
        match renewed {
            Ok(access_token) => {
                debug!("session renewed");
                self.emit(AuthEvent::Renewed);
                Ok(access_token)
            }
            Err(err) => {
                warn!("session renewal failed: {err}");
                self.expire_session();
                Err(ApiError::Unauthenticated)
            }
        }
    }

    async fn call_refresh_endpoint(&self) -> Result<RefreshResponse> {
        let url = self.url_for(REFRESH_PATH);
        // The expired bearer is deliberately not sent; the cookie jar carries
        // the refresh credential.
        let res = self
            .http
            .post(&url)
            .headers(self.headers(None, &HeaderMap::new()))
            .body("{}")
            .send()
            .await?;
        into_api_response(&Method::POST, &url, res).await?.json()
    }

    fn expire_session(&self) {
        if let Err(err) = self.session.clear_session() {
            warn!("failed to clear session: {err}");
        }
        self.emit(AuthEvent::SessionExpired);
    }
}

async fn into_api_response(
    method: &Method,
    url: &str,
    res: reqwest::Response,
) -> Result<ApiResponse> {
    let status = res.status();
    let headers = res.headers().clone();
    let body = res.bytes().await?;
    if status.is_success() {
        return Ok(ApiResponse {
            status,
            headers,
            body,
            url: url.to_string(),
        });
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Err(ApiError::Status {
        method: method.clone(),
        url: url.to_string(),
        status,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
