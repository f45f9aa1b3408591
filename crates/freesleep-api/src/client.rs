// free-sleep HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, status mapping and
// body decoding. Endpoint groups (device status, settings, metrics,
// system) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the free-sleep server running on a pod.
///
/// Stateless: every call is a single request bounded by the transport
/// timeout, with no retries. Retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct FreeSleepClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl FreeSleepClient {
    /// Create a client for `base_url` (e.g. `http://192.168.1.50:3000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client from a pod host name or IP and a port.
    pub fn from_host(host: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        Self::new(Self::base_url_for(host, port)?, transport)
    }

    /// `http://{host}:{port}/`. IPv6 literals may be given with or without
    /// brackets.
    pub fn base_url_for(host: &str, port: u16) -> Result<Url, Error> {
        let mut url = Url::parse("http://localhost/")?;
        let bare = host.trim().trim_start_matches('[').trim_end_matches(']');
        match bare.parse::<IpAddr>() {
            Ok(ip) => url
                .set_ip_host(ip)
                .map_err(|()| Error::InvalidUrl(url::ParseError::InvalidIpv6Address))?,
            Err(_) => url.set_host(Some(host.trim()))?,
        }
        url.set_port(Some(port))
            .map_err(|()| Error::InvalidUrl(url::ParseError::InvalidPort))?;
        Ok(url)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// `timeout` is only used to label [`Error::Timeout`]; the actual bound
    /// is whatever the supplied client was built with.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// The pod base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let path = url.path().to_owned();

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = self.read_body(&path, resp).await?;
        decode(&body)
    }

    /// Send a POST request with a JSON body. The response body, if any,
    /// is discarded: writes only need an acknowledgement.
    pub(crate) async fn post(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!("POST {}", url);
        let path = url.path().to_owned();

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if resp.status() == reqwest::StatusCode::NO_CONTENT {
            trace!(path, "write acknowledged (204)");
            return Ok(());
        }
        self.read_body(&path, resp).await.map(|_| ())
    }

    /// Check the status line and read the body as text.
    async fn read_body(&self, path: &str, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                path: path.to_owned(),
                message: preview(&body).to_owned(),
            });
        }

        resp.text().await.map_err(|e| self.map_send_error(e))
    }

    /// Translate a `reqwest` failure into the most specific variant.
    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            Error::ConnectionRefused {
                url: self.base_url.to_string(),
                reason: err.to_string(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
