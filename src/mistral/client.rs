//! Workflow service client
//!
//! Combines the endpoint, token provider and transport. Resource modules
//! build URLs with [`ServiceClient::service_url`] and dispatch through
//! [`ServiceClient::request`].

use super::auth::TokenProvider;
use super::http::{sanitize_for_log, HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::cancel::CancelToken;
use crate::error::{ApiError, Error, Result};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;
use url::Url;

pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Per-request options
#[derive(Debug, Default)]
pub struct RequestOpts {
    pub body: Option<Vec<u8>>,
    pub content_type: Option<&'static str>,
    /// Send `Accept: application/json`
    pub accept_json: bool,
}

impl RequestOpts {
    pub fn json() -> Self {
        Self {
            accept_json: true,
            ..Self::default()
        }
    }
}

/// Client for one workflow service endpoint, e.g. `https://cloud:8989/v2/`
///
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct ServiceClient {
    endpoint: Url,
    token: Arc<dyn TokenProvider>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Create a client with an explicit transport
    pub fn new(
        endpoint: &str,
        token: Arc<dyn TokenProvider>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            token,
            transport,
        })
    }

    /// Create a client backed by the default reqwest transport
    pub fn connect(endpoint: &str, token: impl TokenProvider + 'static) -> Result<Self> {
        let transport = ReqwestTransport::new().map_err(|source| Error::Transport {
            operation: "connect",
            url: endpoint.to_string(),
            source,
        })?;
        Self::new(endpoint, Arc::new(token), Arc::new(transport))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a resource URL from path segments; each segment is percent-encoded
    pub fn service_url(&self, segments: &[&str]) -> Result<Url> {
        let mut path = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.is_empty() || *segment == "." || *segment == ".." {
                return Err(Error::encoding(
                    "path segment",
                    format!("{:?} is not a valid resource identifier", segment),
                ));
            }
            path.push(urlencoding::encode(segment).into_owned());
        }

        self.endpoint
            .join(&path.join("/"))
            .map_err(|e| Error::encoding("path segment", e.to_string()))
    }

    /// Resolve a link returned by the service (absolute or endpoint-relative)
    pub fn resolve(&self, link: &str) -> std::result::Result<Url, url::ParseError> {
        self.endpoint.join(link)
    }

    /// Send one request.
    ///
    /// Attaches the auth token, honors `cancel` while waiting for the token
    /// and the response, and maps non-2xx answers to [`Error::Api`].
    pub async fn request(
        &self,
        cancel: &CancelToken,
        operation: &'static str,
        method: Method,
        url: Url,
        opts: RequestOpts,
    ) -> Result<HttpResponse> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { operation });
        }

        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled { operation }),
            token = self.token.token() => token?,
        };

        let mut request = HttpRequest::new(method, url.clone());
        let token = HeaderValue::from_str(&token)
            .map_err(|_| Error::Auth("token contains invalid header characters".to_string()))?;
        request.headers.insert(AUTH_TOKEN_HEADER, token);
        if opts.accept_json {
            request
                .headers
                .insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        if let Some(content_type) = opts.content_type {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        request.body = opts.body;

        tracing::debug!("{} {}", request.method, url);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} {} cancelled", operation, url);
                return Err(Error::Cancelled { operation });
            }
            response = self.transport.send(request) => response.map_err(|source| Error::Transport {
                operation,
                url: url.to_string(),
                source,
            })?,
        };

        if !response.status.is_success() {
            let body = response.text();
            // Error bodies can echo request data; log a truncated copy
            tracing::error!("API error: {} - {}", response.status, sanitize_for_log(&body));
            return Err(ApiError::new(operation, url.to_string(), response.status, body).into());
        }

        Ok(response)
    }
}

/// Parse the endpoint and make sure relative joins land below it
fn normalize_endpoint(endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| Error::encoding("endpoint", e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::encoding(
            "endpoint",
            format!("{} is not an http(s) base URL", endpoint),
        ));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
