// Authentication endpoints
//
// `/login` is the one form-encoded endpoint: a password-grant style
// credential exchange that answers with a bearer token. `/register`
// is plain JSON. Logout is purely local -- the backend has no
// revocation endpoint.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{HubClient, error_message, parse_body};
use crate::error::Error;
use crate::models::{Credentials, LoginResponse};

/// Fallback message for every login failure without a server message.
pub const LOGIN_FAILED: &str = "Login failed";

impl HubClient {
    /// Exchange username/password for a bearer token.
    ///
    /// On success the token is stored in the session, replacing any
    /// previous one, and the raw response is returned. Failures map to
    /// [`Error::Auth`] carrying the server's `detail`, or
    /// `"Login failed"` when there is none.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, Error> {
        let url = self.url_for(&["login"])?;
        debug!("logging in at {url}");

        let form = Credentials {
            username,
            password: password.expose_secret(),
        };

        // No bearer header and no JSON content type: reqwest sets
        // `application/x-www-form-urlencoded` for `.form()`.
        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "login rejected");
            return Err(Error::Auth {
                message: error_message(&body, LOGIN_FAILED, LOGIN_FAILED),
            });
        }

        let data: LoginResponse = parse_body(&body).map_err(|_| Error::Auth {
            message: LOGIN_FAILED.into(),
        })?;
        if data.access_token.is_empty() {
            return Err(Error::Auth {
                message: LOGIN_FAILED.into(),
            });
        }

        self.session()
            .set_token(&SecretString::from(data.access_token.clone()))?;
        info!(username, "login successful");
        Ok(data)
    }

    /// Create an account. Does not log in; call [`login`](Self::login)
    /// afterwards.
    pub async fn register(&self, username: &str, password: &SecretString) -> Result<Value, Error> {
        let body = Credentials {
            username,
            password: password.expose_secret(),
        };
        let url = self.url_for(&["register"])?;
        let resp = self.send(Method::POST, url, Some(&body)).await?;
        info!(username, "account registered");
        Ok(resp)
    }

    /// Drop the session token. Local only; never fails because nothing
    /// was stored.
    pub fn logout(&self) -> Result<(), Error> {
        self.session().clear_token()?;
        info!("logged out");
        Ok(())
    }
}
