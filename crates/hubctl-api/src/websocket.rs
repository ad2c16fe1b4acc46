//! Live device state over the backend's `/ws/{device_id}` socket.
//!
//! The backend pushes the stored state as a bare text frame (`"ON"`,
//! `"OFF"`, ...) over and over. This module turns that firehose into a
//! stream of *changes*: consecutive duplicates are dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let mut states = client.watch_device_state("dev-1", cancel.clone()).await?;
//! while let Some(state) = states.next().await {
//!     println!("dev-1 is now {}", state?);
//! }
//! ```

use std::pin::Pin;
use std::str::FromStr;

use futures_util::{Stream, StreamExt};
use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::HubClient;
use crate::error::Error;
use crate::models::DeviceState;

/// Stream of state changes for one device.
pub type DeviceStateStream = Pin<Box<dyn Stream<Item = Result<DeviceState, Error>> + Send>>;

impl HubClient {
    /// WebSocket URL for a device: the HTTP base with `ws`/`wss` scheme.
    pub fn device_state_url(&self, device_id: &str) -> Result<Url, Error> {
        let mut url = self.url_for(&["ws", device_id])?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(Error::WebSocket(format!(
                    "cannot derive a WebSocket URL from scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocket(format!("failed to set scheme '{scheme}'")))?;
        Ok(url)
    }

    /// Open the device state socket and stream state changes until the
    /// server closes it or `cancel` fires.
    ///
    /// The connection is established before this returns, so an
    /// unreachable backend fails here rather than on the first poll.
    pub async fn watch_device_state(
        &self,
        device_id: &str,
        cancel: CancellationToken,
    ) -> Result<DeviceStateStream, Error> {
        let url = self.device_state_url(device_id)?;
        tracing::info!(url = %url, "connecting device state WebSocket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocket(e.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(token) = self.session().token() {
            request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
        }

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        tracing::debug!("device state WebSocket connected");

        let (_write, mut read) = ws_stream.split();

        let stream = async_stream::try_stream! {
            let mut last: Option<DeviceState> = None;
            loop {
                let frame = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    frame = read.next() => frame,
                };

                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        let state = parse_state_frame(&text);
                        if last != Some(state) {
                            last = Some(state);
                            yield state;
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "device state socket closed");
                        }
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong/binary -- tungstenite answers pings itself
                    }
                    Some(Err(e)) => {
                        Err::<(), _>(Error::WebSocket(e.to_string()))?;
                    }
                    None => {
                        tracing::info!("device state stream ended");
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Interpret one text frame. Accepts a bare state (`ON`), a quoted one
/// (`"ON"`), or an object with a `state` field.
fn parse_state_frame(text: &str) -> DeviceState {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let raw = match &value {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map.get("state").and_then(serde_json::Value::as_str),
            _ => None,
        };
        if let Some(raw) = raw {
            return DeviceState::from_str(raw.trim()).unwrap_or(DeviceState::Unknown);
        }
    }
    DeviceState::from_str(trimmed).unwrap_or(DeviceState::Unknown)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::{MemoryTokenStore, Session};

    fn client(base: &str) -> HubClient {
        let session = Arc::new(Session::restore(Arc::new(MemoryTokenStore::new())).unwrap());
        HubClient::with_client(reqwest::Client::new(), base, session).unwrap()
    }

    #[test]
    fn ws_url_from_http_base() {
        let c = client("http://localhost:8000");
        assert_eq!(
            c.device_state_url("dev-1").unwrap().as_str(),
            "ws://localhost:8000/ws/dev-1"
        );
    }

    #[test]
    fn wss_url_from_https_base_with_prefix() {
        let c = client("https://hub.example.com/api");
        assert_eq!(
            c.device_state_url("dev 1").unwrap().as_str(),
            "wss://hub.example.com/api/ws/dev%201"
        );
    }

    #[test]
    fn parse_bare_and_wrapped_frames() {
        assert_eq!(parse_state_frame("ON"), DeviceState::On);
        assert_eq!(parse_state_frame(" OFF\n"), DeviceState::Off);
        assert_eq!(parse_state_frame("\"ON\""), DeviceState::On);
        assert_eq!(parse_state_frame(r#"{"state":"off"}"#), DeviceState::Off);
    }

    #[test]
    fn parse_unknown_frames() {
        assert_eq!(parse_state_frame("UNKNOWN"), DeviceState::Unknown);
        assert_eq!(parse_state_frame("garbage"), DeviceState::Unknown);
        assert_eq!(parse_state_frame("42"), DeviceState::Unknown);
    }
}
