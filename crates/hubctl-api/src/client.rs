// Hub backend HTTP client
//
// Wraps `reqwest::Client` with base-URL path joining, bearer injection
// from the shared `Session`, and normalization of every non-2xx answer
// into a single human-readable message. Endpoint groups (auth, devices)
// are inherent methods in sibling modules so this file stays focused on
// transport mechanics.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::session::Session;
use crate::transport::TransportConfig;

/// Fallback when an error body is not JSON at all.
pub const UNKNOWN_ERROR: &str = "Unknown error";
/// Fallback when an error body is JSON but carries no message.
pub const REQUEST_FAILED: &str = "Request failed";

/// Async client for the hub backend.
///
/// Cheap to share behind an `Arc`. The session is shared too: a token
/// stored by [`login`](Self::login) is visible to every later request,
/// and to any other client built on the same `Session`.
pub struct HubClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
}

impl HubClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL and transport settings.
    ///
    /// `base_url` may carry a path prefix (`https://host/api`); endpoint
    /// paths are appended below it.
    pub fn new(
        base_url: &str,
        session: Arc<Session>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, session)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<Session>,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for flows that bypass the JSON helpers).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The session this client reads its credential from.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Shortcut for `session().is_authenticated()`.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn url_for(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve a slash-separated endpoint path such as `"/devices"`.
    fn url_for_path(&self, path: &str) -> Result<Url, Error> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.url_for(&segments)
    }

    // ── Request ──────────────────────────────────────────────────────

    /// Issue one JSON request against `path` and return the parsed body.
    ///
    /// Sends `Content-Type: application/json`, adds `Authorization:
    /// Bearer <token>` when the session holds a token, and serializes
    /// `body` when given. A successful empty body comes back as
    /// [`Value::Null`]. Any non-2xx becomes [`Error::Request`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.url_for_path(path)?;
        self.send(method, url, body).await
    }

    /// Typed variant of [`request`](Self::request).
    pub async fn request_as<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url_for_path(path)?;
        self.send(method, url, body).await
    }

    pub(crate) async fn send<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::Auth {
                    message: format!("stored token is not a valid header value: {e}"),
                })?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|e| Error::Deserialization {
                message: format!("failed to serialize request body: {e}"),
                body: String::new(),
            })?;
            builder = builder.body(bytes);
        }

        let resp = builder.send().await?;
        handle_response(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "response received");

    if !status.is_success() {
        return Err(Error::Request {
            message: error_message(&body, UNKNOWN_ERROR, REQUEST_FAILED),
            status: status.as_u16(),
        });
    }

    parse_body(&body)
}

/// Deserialize a success body; an empty body reads as JSON `null`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `detail` (a string, or a list of `{msg}` validation entries)
/// and then `message`. `unparsable` is used when the body is not JSON,
/// `missing` when it is JSON without a usable message.
pub(crate) fn error_message(body: &str, unparsable: &str, missing: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return unparsable.to_owned();
    };

    let from_detail = match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };

    from_detail
        .or_else(|| value.get("message").and_then(Value::as_str).map(String::from))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| missing.to_owned())
}
