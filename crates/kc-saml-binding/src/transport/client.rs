//! HTTP client abstraction and its `reqwest` implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Method;

use super::TransportConfig;
use crate::cookies::cookie_header;
use crate::error::{SamlError, SamlResult};

/// An outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Header name and value pairs, in order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
    /// Cookies to send, by name.
    pub cookies: BTreeMap<String, String>,
    /// Whether redirects are followed.
    pub allow_redirects: bool,
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Header name and value pairs; repeated headers stay separate.
    pub headers: Vec<(String, String)>,
    /// Body text.
    pub body: String,
}

impl HttpResponse {
    /// Returns the first header with the given name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over every value of the named header.
    pub fn header_values<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + 'n
    where
        'a: 'n,
    {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true for statuses below 400.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Executes HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `request`; a failure to complete the exchange is a
    /// [`SamlError::Connection`].
    async fn execute(&self, request: HttpRequest) -> SamlResult<HttpResponse>;
}

/// [`HttpClient`] backed by `reqwest`.
///
/// TLS settings come from the [`TransportConfig`] and cannot change later.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    direct: reqwest::Client,
    following: reqwest::Client,
}

impl ReqwestClient {
    /// Builds the client from `config`.
    pub fn new(config: &TransportConfig) -> SamlResult<Self> {
        let roots = match &config.ca_bundle {
            Some(path) => {
                let pem = read_pem(path)?;
                Some(reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    SamlError::Config(format!("invalid CA bundle {}: {e}", path.display()))
                })?)
            }
            None => None,
        };

        let identity = match config.client_identity()? {
            Some((cert, key)) => {
                let mut pem = read_pem(cert)?;
                pem.push(b'\n');
                pem.extend(read_pem(key)?);
                Some(reqwest::Identity::from_pem(&pem).map_err(|e| {
                    SamlError::Config(format!("invalid client certificate {}: {e}", cert.display()))
                })?)
            }
            None => None,
        };

        let build = |policy: reqwest::redirect::Policy| {
            let mut builder = reqwest::Client::builder()
                .redirect(policy)
                .danger_accept_invalid_certs(!config.verify);
            if let Some(root) = &roots {
                builder = builder
                    .tls_built_in_root_certs(false)
                    .add_root_certificate(root.clone());
            }
            if let Some(identity) = &identity {
                builder = builder.identity(identity.clone());
            }
            builder
                .build()
                .map_err(|e| SamlError::Config(format!("failed to build HTTP client: {e}")))
        };

        Ok(Self {
            direct: build(reqwest::redirect::Policy::none())?,
            following: build(reqwest::redirect::Policy::default())?,
        })
    }
}

fn read_pem(path: &std::path::Path) -> SamlResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| SamlError::Config(format!("cannot read {}: {e}", path.display())))
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> SamlResult<HttpResponse> {
        let client = if request.allow_redirects {
            &self.following
        } else {
            &self.direct
        };

        let mut builder = client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = cookie_header(&request.cookies) {
            builder = builder.header(reqwest::header::COOKIE, cookies);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SamlError::Connection(format!("{}: {e}", request.url)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| SamlError::Connection(format!("{}: {e}", request.url)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
