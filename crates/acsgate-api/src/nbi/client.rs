// NBI HTTP client
//
// Wraps `reqwest::Client` with controller URL construction, status
// checking, and body decoding. Endpoint groups (devices, tasks) are
// implemented as inherent methods in sibling files to keep this module
// focused on transport mechanics.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the controller's northbound interface.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct NbiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl NbiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the NBI root (e.g. `http://localhost:7557`); a path
    /// prefix is kept, so NBIs published under a sub-path work too.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout_secs: 0,
        }
    }

    /// The NBI base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// Device ids may contain `/` or `%`; pushing them as segments keeps
    /// them intact on the wire.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body, returning response headers too.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<(T, HeaderMap), Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let resp = Self::check_status(resp).await?;
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(bytes = body.len(), "response body received");

        let value = Self::decode(&body)?;
        Ok((value, headers))
    }

    /// Send a POST request with a JSON body.
    ///
    /// Returns the status code alongside the raw body so callers can
    /// distinguish inline completion from queuing.
    pub(crate) async fn post_json(
        &self,
        url: Url,
        params: &[(&str, String)],
        body: &(impl serde::Serialize + Sync),
    ) -> Result<(reqwest::StatusCode, String), Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .query(params)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let resp = Self::check_status(resp).await?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        Ok((status, text))
    }

    /// Turn any non-2xx response into `Error::Upstream`, keeping the body verbatim.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Upstream {
            status: status.as_u16(),
            body,
        })
    }

    pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.to_owned(),
            }
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() && self.timeout_secs > 0 {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}
