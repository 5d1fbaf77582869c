// Controller HTTP client
//
// Wraps `reqwest::Client` with controller-specific URL construction, the
// credential-replay request loop, and envelope unwrapping. All endpoint
// modules (sites, devices, etc.) are implemented as inherent methods via
// separate files to keep this module focused on transport mechanics.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ControllerConfig;
use crate::error::Error;
use crate::models::ApiResponse;
use crate::session::SessionState;
use crate::transport::TransportConfig;

/// Client for a controller's session-authenticated JSON API.
///
/// Owns exactly one [`SessionState`] and one HTTP connection pool.
/// Credentials are acquired lazily: the first request that hits a 401
/// triggers a login and is replayed once with the fresh session.
pub struct Controller {
    http: reqwest::Client,
    config: ControllerConfig,
    session: SessionState,
}

/// An in-flight request description, captured as a value so the 401 path
/// can replay it verbatim: same method, URL, and body. Only the credential
/// headers are re-read from session state on replay.
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) body: Option<Value>,
}

impl PendingRequest {
    pub(crate) fn new(method: Method, url: Url, body: Option<Value>) -> Self {
        Self { method, url, body }
    }
}

impl Controller {
    /// Create a new client from a `ControllerConfig`.
    ///
    /// Builds the HTTP client according to the config's TLS and timeout
    /// settings. No network I/O happens here; login is deferred until the
    /// first request (or an explicit [`login`](Self::login)).
    pub fn new(config: ControllerConfig) -> Result<Self, Error> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let http = transport.build_client()?;
        Ok(Self {
            http,
            config,
            session: SessionState::default(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: ControllerConfig) -> Self {
        Self {
            http,
            config,
            session: SessionState::default(),
        }
    }

    /// The current site identifier.
    pub fn site(&self) -> &str {
        &self.config.site
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.config.url
    }

    pub(crate) fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn session(&self) -> &SessionState {
        &self.session
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a controller-level API path:
    /// `{base}/api/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Url {
        let base = self.config.url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/{path}");
        Url::parse(&full).expect("invalid API URL")
    }

    /// Build a site-scoped URL: `{base}/api/s/{site}/{path}`
    ///
    /// Most endpoints are site-scoped: stat/sta, stat/event, cmd/stamgr, etc.
    pub(crate) fn site_url(&self, path: &str) -> Url {
        let base = self.config.url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/s/{}/{path}", self.config.site);
        Url::parse(&full).expect("invalid site URL")
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        debug!("GET {}", url);
        self.execute(PendingRequest::new(Method::GET, url, None))
            .await
    }

    /// Send a POST request with JSON body and unwrap the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Value,
    ) -> Result<Vec<T>, Error> {
        debug!("POST {}", url);
        self.execute(PendingRequest::new(Method::POST, url, Some(body)))
            .await
    }

    // ── Executor ─────────────────────────────────────────────────────

    /// Issue one request, re-authenticating and replaying at most once.
    ///
    /// On a 401 the executor tries to win the session's single-flight
    /// guard. The winner runs the login sub-protocol and replays the
    /// original request; the replay's outcome is final. A loser fails
    /// fast rather than queuing behind a login that may itself be
    /// failing.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<Vec<T>, Error> {
        let mut replayed = false;
        loop {
            let resp = self.send_once(&request).await?;
            let status = resp.status();

            if status == StatusCode::UNAUTHORIZED {
                if replayed {
                    return Err(Error::Authentication {
                        message: "credentials rejected after re-authentication".into(),
                    });
                }
                if !self.session.begin_auth() {
                    return Err(Error::Authentication {
                        message: "session rejected while another login is in flight".into(),
                    });
                }
                debug!(url = %request.url, "session rejected, re-authenticating");
                self.authenticate().await?;
                replayed = true;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = resp.text().await.map_err(Error::from_transport)?;
            return parse_envelope(status, &body);
        }
    }

    /// Send a single request with whatever credentials are currently
    /// stored. Headers are omitted entirely before the first login.
    pub(crate) async fn send_once(
        &self,
        request: &PendingRequest,
    ) -> Result<reqwest::Response, Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());

        if let Some(credentials) = self.session.credentials() {
            if let Some(token) = credentials.token {
                builder = builder.header(reqwest::header::COOKIE, format!("unifises={token}"));
            }
            if let Some(csrf) = credentials.csrf_token {
                builder = builder.header("X-Csrf-Token", csrf);
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(Error::from_transport)
    }
}

/// Parse the `{ meta, data }` envelope, returning `data` on success or an
/// `Error::Upstream` carrying the controller's message if `rc != "ok"`.
fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Vec<T>, Error> {
    let envelope: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        let preview = &body[..body.len().min(200)];
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })?;

    match envelope.meta.rc.as_str() {
        "ok" => Ok(envelope.data),
        _ => Err(Error::Upstream {
            status: status.as_u16(),
            body: envelope
                .meta
                .msg
                .unwrap_or_else(|| format!("rc={}", envelope.meta.rc)),
        }),
    }
}
