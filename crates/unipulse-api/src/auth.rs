// Authentication sub-protocol
//
// Unauthenticated login POST, independent extraction of the session
// cookie and anti-forgery token from Set-Cookie headers, and the
// single-flight bracket around every attempt. The executor calls into
// this on a 401; callers can also login/logout explicitly.

use reqwest::header::{HeaderMap, SET_COOKIE};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;

use crate::client::Controller;
use crate::error::Error;
use crate::session::Credentials;

impl Controller {
    /// Authenticate with the controller using the configured credentials.
    ///
    /// `POST /api/login` with `{username, password, remember}`. On success
    /// the session cookie and anti-forgery token are stored and attached
    /// to all subsequent requests. Fails fast if another login attempt is
    /// already in flight.
    pub async fn login(&self) -> Result<(), Error> {
        if !self.session().begin_auth() {
            return Err(Error::Authentication {
                message: "another login attempt is already in flight".into(),
            });
        }
        self.authenticate().await
    }

    /// End the current session and drop the stored credentials.
    ///
    /// `POST /api/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("logout");
        debug!("logging out at {}", url);
        let _: Vec<serde_json::Value> = self.post(url, json!({})).await?;
        self.session().clear();
        debug!("logout complete");
        Ok(())
    }

    /// Log in only if no credentials are stored yet.
    ///
    /// The push channel presents the session token at connection time, so
    /// the listener calls this before opening the socket.
    pub(crate) async fn ensure_authenticated(&self) -> Result<(), Error> {
        if self.session().credentials().is_some() {
            return Ok(());
        }
        self.login().await
    }

    /// Run one authentication attempt. The caller must already hold the
    /// single-flight guard; the guard clears here whatever the outcome.
    pub(crate) async fn authenticate(&self) -> Result<(), Error> {
        match self.login_request().await {
            Ok(credentials) => {
                self.session().complete_auth(Some(credentials));
                debug!("login successful");
                Ok(())
            }
            Err(err) => {
                self.session().complete_auth(None);
                Err(err)
            }
        }
    }

    /// The raw login exchange: no credential headers attached, both
    /// artifacts extracted independently from the response.
    async fn login_request(&self) -> Result<Credentials, Error> {
        let url = self.api_url("login");
        debug!("logging in at {}", url);

        let config = self.config();
        let body = json!({
            "username": config.username,
            "password": config.password.expose_secret(),
            "remember": config.remember,
        });

        let resp = match self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::from_transport)
        {
            Ok(resp) => resp,
            Err(err @ Error::Certificate(_)) => return Err(err),
            Err(err) => {
                return Err(Error::Authentication {
                    message: format!("login transport failure: {err}"),
                });
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        // Absence of either artifact is tolerated -- some deployments
        // omit the anti-forgery token entirely.
        Ok(Credentials {
            token: extract_cookie_value(resp.headers(), "unifises"),
            csrf_token: extract_cookie_value(resp.headers(), "csrf_token"),
        })
    }
}

/// Scan every `Set-Cookie` header for `{name}=<value>`, ignoring cookie
/// attributes (`Path`, `HttpOnly`, ...).
fn extract_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name && !value.is_empty()).then(|| value.trim().to_owned())
        })
}
