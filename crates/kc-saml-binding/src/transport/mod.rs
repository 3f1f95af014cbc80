//! Cookie-aware HTTP transport for SAML bindings.
//!
//! A [`Transport`] owns one cookie jar and replays its cookies on every
//! request it sends, capturing `Set-Cookie` fields from each response. SOAP
//! exchanges go through the SOAP binding with optional envelope signing.
//!
//! # Example
//!
//! ```rust,ignore
//! use kc_saml_binding::transport::{Transport, TransportConfig};
//!
//! let mut transport = Transport::from_config(TransportConfig::load("transport.toml")?)?;
//! let outcome = transport
//!     .send_soap::<LogoutResponse, Infallible>(
//!         ProtocolMessage::structured(&request),
//!         "https://idp.example.com/slo/soap",
//!         None,
//!         true,
//!         None,
//!     )
//!     .await?;
//! ```

mod client;
mod config;
mod signer;

pub use client::*;
pub use config::*;
pub use signer::*;

use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info, warn};

use crate::bindings::{
    decode_soap, encode_post, encode_redirect, encode_soap, EncodedPayload, HeaderTypes,
    SamlMessageType, SoapEnvelope,
};
use crate::cookies::{export, ingest, CookieJar};
use crate::error::{SamlError, SamlResult};
use crate::message::{FromElement, ProtocolMessage};

const SOAP_CONTENT_TYPE: &str = "application/soap+xml";

/// Per-request options, merged over the transport configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
    /// Overrides the configured redirect behavior.
    pub allow_redirects: Option<bool>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets whether redirects are followed for this request.
    #[must_use]
    pub const fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }
}

/// Result of a SOAP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapOutcome<B, H> {
    /// The response envelope was decoded.
    Parsed(SoapEnvelope<B, H>),
    /// The request could not be delivered.
    Unreachable,
    /// The peer answered with an error status.
    Rejected {
        /// HTTP status code.
        status: u16,
    },
}

impl<B, H> SoapOutcome<B, H> {
    /// Returns the decoded envelope, if there is one.
    pub fn into_parsed(self) -> Option<SoapEnvelope<B, H>> {
        match self {
            Self::Parsed(envelope) => Some(envelope),
            Self::Unreachable | Self::Rejected { .. } => None,
        }
    }
}

/// HTTP transport holding the cookie state of one session.
///
/// Methods that send take `&mut self`; use one transport per concurrent
/// session.
pub struct Transport<C = ReqwestClient> {
    client: C,
    config: TransportConfig,
    jar: CookieJar,
    signer: Option<Arc<dyn Signer>>,
}

impl Transport<ReqwestClient> {
    /// Builds a transport backed by `reqwest`.
    pub fn from_config(config: TransportConfig) -> SamlResult<Self> {
        let client = ReqwestClient::new(&config)?;
        Ok(Self::new(client, config))
    }
}

impl<C: HttpClient> Transport<C> {
    /// Creates a transport with an empty cookie jar.
    pub fn new(client: C, config: TransportConfig) -> Self {
        Self {
            client,
            config,
            jar: CookieJar::new(),
            signer: None,
        }
    }

    /// Sets the signer used by [`Transport::send_soap`].
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// The transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The session cookies.
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Mutable access to the session cookies.
    pub fn jar_mut(&mut self) -> &mut CookieJar {
        &mut self.jar
    }

    /// Forgets every session cookie.
    pub fn reset_cookies(&mut self) {
        self.jar.clear();
    }

    /// Sends a request carrying the session cookies and records the cookies
    /// the response sets.
    pub async fn send(
        &mut self,
        url: &str,
        method: Method,
        options: RequestOptions,
    ) -> SamlResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: options.headers,
            body: options.body,
            cookies: export(&self.jar),
            allow_redirects: options
                .allow_redirects
                .unwrap_or(self.config.allow_redirects),
        };
        debug!(
            method = %request.method,
            url,
            cookies = request.cookies.len(),
            "sending request"
        );

        let response = self.client.execute(request).await?;

        let set_cookies: Vec<&str> = response.header_values("set-cookie").collect();
        if !set_cookies.is_empty() {
            ingest(&mut self.jar, set_cookies);
        }
        Ok(response)
    }

    /// Encodes `message` as an auto-submitting form for the browser.
    #[must_use]
    pub fn use_http_form_post(
        &self,
        message: ProtocolMessage<'_>,
        destination: &str,
        relay_state: &str,
    ) -> EncodedPayload {
        encode_post(message, destination, relay_state, SamlMessageType::Request)
    }

    /// Encodes `message` as a redirect; no direct response is expected.
    pub fn use_http_get(
        &self,
        message: ProtocolMessage<'_>,
        destination: &str,
        relay_state: &str,
    ) -> SamlResult<EncodedPayload> {
        encode_redirect(message, destination, relay_state, SamlMessageType::Request)
    }

    /// Posts `message` in a SOAP envelope and decodes the answer.
    ///
    /// A transport failure yields [`SoapOutcome::Unreachable`] and an error
    /// status yields [`SoapOutcome::Rejected`]; encoding, signing and
    /// decoding failures are errors.
    pub async fn send_soap<B, H>(
        &mut self,
        message: ProtocolMessage<'_>,
        destination: &str,
        headers: Option<Vec<(String, String)>>,
        sign: bool,
        header_types: Option<&HeaderTypes<H>>,
    ) -> SamlResult<SoapOutcome<B, H>>
    where
        B: FromElement,
    {
        let mut headers = headers.unwrap_or_default();
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        headers.push(("content-type".to_string(), SOAP_CONTENT_TYPE.to_string()));

        let mut envelope = encode_soap(message, &[])?;
        if sign {
            envelope = self.sign(envelope, &message)?;
        }

        let options = RequestOptions {
            headers,
            body: Some(envelope),
            allow_redirects: None,
        };
        let response = match self.send(destination, Method::POST, options).await {
            Ok(response) => response,
            Err(err) => {
                info!(destination, error = %err, "SOAP request failed");
                return Ok(SoapOutcome::Unreachable);
            }
        };

        if !response.is_success() {
            info!(destination, status = response.status, "SOAP request rejected");
            return Ok(SoapOutcome::Rejected {
                status: response.status,
            });
        }

        debug!(destination, status = response.status, "SOAP response received");
        decode_soap(&response.body, header_types).map(SoapOutcome::Parsed)
    }

    fn sign(&self, envelope: String, message: &ProtocolMessage<'_>) -> SamlResult<String> {
        let Some(signer) = &self.signer else {
            warn!("signing requested but no signer configured, sending unsigned");
            return Ok(envelope);
        };

        let (type_name, id) = message.signing_target()?;
        signer
            .sign(&envelope, &type_name, &id)
            .map_err(|err| match err {
                SamlError::Signing(_) => err,
                other => SamlError::Signing(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::bindings::decode_soap_body;
    use crate::cookies::CookieKey;
    use crate::types::{
        EcpHeader, EcpRelayState, LogoutRequest, LogoutResponse, NameId, ECP_NS,
    };

    /// Replays canned responses and records every request.
    #[derive(Default)]
    struct FakeClient {
        responses: Mutex<VecDeque<SamlResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeClient {
        fn respond(self, response: SamlResult<HttpResponse>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for FakeClient {
        async fn execute(&self, request: HttpRequest) -> SamlResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SamlError::Connection("no canned response".to_string())))
        }
    }

    #[async_trait]
    impl HttpClient for Arc<FakeClient> {
        async fn execute(&self, request: HttpRequest) -> SamlResult<HttpResponse> {
            self.as_ref().execute(request).await
        }
    }

    fn ok(headers: &[(&str, &str)], body: &str) -> SamlResult<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        })
    }

    fn transport(client: FakeClient) -> (Transport<Arc<FakeClient>>, Arc<FakeClient>) {
        let client = Arc::new(client);
        let transport = Transport::new(Arc::clone(&client), TransportConfig::default());
        (transport, client)
    }

    fn logout_request() -> LogoutRequest {
        LogoutRequest::new("https://sp.example.com", NameId::transient("t-1"))
    }

    fn logout_response_envelope(in_response_to: &str) -> String {
        let response = LogoutResponse::success("https://idp.example.com").in_response_to(in_response_to);
        encode_soap(ProtocolMessage::structured(&response), &[]).unwrap()
    }

    #[tokio::test]
    async fn captures_and_replays_cookies() {
        let client = FakeClient::default()
            .respond(ok(
                &[
                    ("Set-Cookie", "sid=abc; Path=/"),
                    ("set-cookie", "lang=en"),
                ],
                "",
            ))
            .respond(ok(&[], ""));
        let (mut transport, client) = transport(client);

        transport
            .send("https://idp.example.com/sso", Method::GET, RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(transport.jar().len(), 2);
        assert!(transport.jar().get(&CookieKey::new("", "/", "sid")).is_some());

        transport
            .send("https://idp.example.com/sso", Method::GET, RequestOptions::new())
            .await
            .unwrap();

        let requests = client.requests();
        assert!(requests[0].cookies.is_empty());
        assert_eq!(requests[1].cookies["sid"], "abc");
        assert_eq!(requests[1].cookies["lang"], "en");
    }

    #[tokio::test]
    async fn redirect_option_overrides_config() {
        let client = FakeClient::default()
            .respond(ok(&[], ""))
            .respond(ok(&[], ""));
        let (mut transport, client) = transport(client);

        transport
            .send("https://idp.example.com/a", Method::GET, RequestOptions::new())
            .await
            .unwrap();
        transport
            .send(
                "https://idp.example.com/b",
                Method::GET,
                RequestOptions::new().allow_redirects(true),
            )
            .await
            .unwrap();

        let requests = client.requests();
        assert!(!requests[0].allow_redirects);
        assert!(requests[1].allow_redirects);
    }

    #[tokio::test]
    async fn connection_errors_propagate_from_send() {
        let client = FakeClient::default()
            .respond(Err(SamlError::Connection("refused".to_string())));
        let (mut transport, _) = transport(client);

        let err = transport
            .send("https://idp.example.com/sso", Method::GET, RequestOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn reset_cookies_empties_jar() {
        let client = FakeClient::default().respond(ok(&[("Set-Cookie", "sid=abc")], ""));
        let (mut transport, _) = transport(client);

        transport
            .send("https://idp.example.com/sso", Method::GET, RequestOptions::new())
            .await
            .unwrap();
        assert!(!transport.jar().is_empty());
        transport.reset_cookies();
        assert!(transport.jar().is_empty());
    }

    #[tokio::test]
    async fn send_soap_parses_response() {
        let request = logout_request();
        let client = FakeClient::default().respond(ok(
            &[("Content-Type", "application/soap+xml")],
            &logout_response_envelope(&request.id),
        ));
        let (mut transport, client) = transport(client);

        let outcome = transport
            .send_soap::<LogoutResponse, Infallible>(
                ProtocolMessage::structured(&request),
                "https://idp.example.com/slo",
                Some(vec![
                    ("Content-Type".to_string(), "text/plain".to_string()),
                    ("SOAPAction".to_string(), "logout".to_string()),
                ]),
                false,
                None,
            )
            .await
            .unwrap();

        let envelope = outcome.into_parsed().unwrap();
        assert_eq!(envelope.body.in_response_to.as_deref(), Some(request.id.as_str()));

        let sent = &client.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(
            sent.headers,
            vec![
                ("SOAPAction".to_string(), "logout".to_string()),
                ("content-type".to_string(), SOAP_CONTENT_TYPE.to_string()),
            ]
        );
        let body = sent.body.as_deref().unwrap();
        assert_eq!(decode_soap_body::<LogoutRequest>(body).unwrap(), request);
    }

    #[tokio::test]
    async fn send_soap_decodes_expected_headers() {
        let request = logout_request();
        let response = LogoutResponse::success("https://idp.example.com");
        let relay_state = EcpRelayState::new("rs-9");
        let envelope =
            encode_soap(ProtocolMessage::structured(&response), &[&relay_state]).unwrap();
        let client = FakeClient::default().respond(ok(&[], &envelope));
        let (mut transport, _) = transport(client);

        let types = HeaderTypes::<EcpHeader>::new().with::<EcpRelayState>();
        let outcome = transport
            .send_soap::<LogoutResponse, EcpHeader>(
                ProtocolMessage::structured(&request),
                "https://idp.example.com/slo",
                None,
                false,
                Some(&types),
            )
            .await
            .unwrap();

        let envelope = outcome.into_parsed().unwrap();
        assert_eq!(
            envelope.headers.get(ECP_NS, "RelayState"),
            Some(&EcpHeader::RelayState(relay_state))
        );
    }

    #[tokio::test]
    async fn send_soap_degrades_transport_failure() {
        let client = FakeClient::default()
            .respond(Err(SamlError::Connection("connection refused".to_string())));
        let (mut transport, _) = transport(client);

        let outcome = transport
            .send_soap::<LogoutResponse, Infallible>(
                ProtocolMessage::structured(&logout_request()),
                "https://idp.example.com/slo",
                None,
                false,
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome, SoapOutcome::Unreachable);
    }

    #[tokio::test]
    async fn send_soap_reports_error_status() {
        let client = FakeClient::default().respond(Ok(HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "boom".to_string(),
        }));
        let (mut transport, _) = transport(client);

        let outcome = transport
            .send_soap::<LogoutResponse, Infallible>(
                ProtocolMessage::structured(&logout_request()),
                "https://idp.example.com/slo",
                None,
                false,
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome, SoapOutcome::Rejected { status: 500 });
        assert!(outcome.into_parsed().is_none());
    }

    #[tokio::test]
    async fn send_soap_rejects_malformed_answer() {
        let client = FakeClient::default().respond(ok(&[], "<html>oops</html>"));
        let (mut transport, _) = transport(client);

        let err = transport
            .send_soap::<LogoutResponse, Infallible>(
                ProtocolMessage::structured(&logout_request()),
                "https://idp.example.com/slo",
                None,
                false,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SamlError::MalformedEnvelope(_)));
    }

    #[tokio::test]
    async fn send_soap_signs_envelope() {
        let request = logout_request();
        let client = FakeClient::default().respond(ok(&[], &logout_response_envelope(&request.id)));
        let (transport, client) = transport(client);

        let signer = |envelope: &str, type_name: &str, id: &str| -> SamlResult<String> {
            Ok(envelope.replace(
                "</SOAP-ENV:Envelope>",
                &format!("<!-- signed {type_name} {id} --></SOAP-ENV:Envelope>"),
            ))
        };
        let mut transport = transport.with_signer(Arc::new(signer));

        transport
            .send_soap::<LogoutResponse, Infallible>(
                ProtocolMessage::structured(&request),
                "https://idp.example.com/slo",
                None,
                true,
                None,
            )
            .await
            .unwrap();

        let body = client.requests()[0].body.clone().unwrap();
        assert!(body.ends_with(&format!(
            "<!-- signed LogoutRequest {} --></SOAP-ENV:Envelope>",
            request.id
        )));
    }

    #[tokio::test]
    async fn signing_failure_is_fatal() {
        let client = FakeClient::default();
        let (transport, client) = transport(client);
        let signer = |_: &str, _: &str, _: &str| -> SamlResult<String> {
            Err(SamlError::Internal("key unavailable".to_string()))
        };
        let mut transport = transport.with_signer(Arc::new(signer));

        let err = transport
            .send_soap::<LogoutResponse, Infallible>(
                ProtocolMessage::structured(&logout_request()),
                "https://idp.example.com/slo",
                None,
                true,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SamlError::Signing(ref msg) if msg.contains("key unavailable")));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn browser_bindings_use_request_parameter() {
        let (transport, _) = transport(FakeClient::default());
        let request = logout_request();

        let form = transport.use_http_form_post(
            ProtocolMessage::structured(&request),
            "https://idp.example.com/slo",
            "rs",
        );
        assert!(form.body.contains(r#"name="SAMLRequest""#));

        let redirect = transport
            .use_http_get(
                ProtocolMessage::structured(&request),
                "https://idp.example.com/slo",
                "rs",
            )
            .unwrap();
        assert!(redirect
            .location()
            .unwrap()
            .starts_with("https://idp.example.com/slo?SAMLRequest="));
    }
}
