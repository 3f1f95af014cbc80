//! HTTP transport tests against a mock server.

use std::convert::Infallible;

use kc_saml_binding::bindings::{decode_soap_body, encode_soap};
use kc_saml_binding::transport::{RequestOptions, SoapOutcome, Transport, TransportConfig};
use kc_saml_binding::{LogoutRequest, LogoutResponse, NameId, ProtocolMessage, SamlError};
use reqwest::Method;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> anyhow::Result<Transport> {
    Ok(Transport::from_config(TransportConfig::default())?)
}

#[tokio::test]
async fn cookies_set_by_server_are_sent_back() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "sid=abc123; Path=/")
                .append_header("Set-Cookie", "theme=dark"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("cookie", "sid=abc123; theme=dark"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = transport()?;
    transport
        .send(&format!("{}/login", server.uri()), Method::GET, RequestOptions::new())
        .await?;
    assert_eq!(transport.jar().len(), 2);

    let response = transport
        .send(&format!("{}/profile", server.uri()), Method::GET, RequestOptions::new())
        .await?;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "welcome");
    Ok(())
}

#[tokio::test]
async fn expired_cookie_removes_stored_one() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(path("/set"))
        .respond_with(ResponseTemplate::new(200).append_header("Set-Cookie", "sid=abc"))
        .mount(&server)
        .await;
    Mock::given(path("/clear"))
        .respond_with(ResponseTemplate::new(200).append_header("Set-Cookie", "sid=gone; Max-Age=0"))
        .mount(&server)
        .await;

    let mut transport = transport()?;
    transport
        .send(&format!("{}/set", server.uri()), Method::GET, RequestOptions::new())
        .await?;
    assert_eq!(transport.jar().len(), 1);

    transport
        .send(&format!("{}/clear", server.uri()), Method::GET, RequestOptions::new())
        .await?;
    assert!(transport.jar().is_empty());
    Ok(())
}

#[tokio::test]
async fn redirects_are_not_followed_by_default() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/next", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_string("arrived"))
        .mount(&server)
        .await;

    let mut transport = transport()?;
    let url = format!("{}/start", server.uri());

    let response = transport.send(&url, Method::GET, RequestOptions::new()).await?;
    assert_eq!(response.status, 302);
    assert!(response.header("location").is_some_and(|l| l.ends_with("/next")));

    let response = transport
        .send(&url, Method::GET, RequestOptions::new().allow_redirects(true))
        .await?;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "arrived");
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_connection_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let url = format!("{}/gone", server.uri());
    drop(server);

    let mut transport = transport()?;
    let err = transport
        .send(&url, Method::GET, RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SamlError::Connection(_)));
    Ok(())
}

#[tokio::test]
async fn soap_logout_exchange() -> anyhow::Result<()> {
    let request = LogoutRequest::new("https://sp.example.com", NameId::transient("t-42"))
        .with_session_index("s-1");
    let answer = LogoutResponse::success("https://idp.example.com").in_response_to(&request.id);
    let answer_envelope = encode_soap(ProtocolMessage::structured(&answer), &[])?;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slo"))
        .and(header("content-type", "application/soap+xml"))
        .and(body_string_contains(request.id.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(answer_envelope))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = transport()?;
    let outcome = transport
        .send_soap::<LogoutResponse, Infallible>(
            ProtocolMessage::structured(&request),
            &format!("{}/slo", server.uri()),
            None,
            false,
            None,
        )
        .await?;

    let envelope = match outcome {
        SoapOutcome::Parsed(envelope) => envelope,
        other => anyhow::bail!("expected a parsed response, got {other:?}"),
    };
    assert!(envelope.body.is_success());
    assert_eq!(envelope.body.in_response_to.as_deref(), Some(request.id.as_str()));

    let received = server.received_requests().await.unwrap_or_default();
    let sent = String::from_utf8(received[0].body.clone())?;
    assert_eq!(decode_soap_body::<LogoutRequest>(&sent)?, request);
    Ok(())
}

#[tokio::test]
async fn soap_fault_status_is_rejected() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("fault"))
        .mount(&server)
        .await;

    let request = LogoutRequest::new("https://sp.example.com", NameId::transient("t-1"));
    let mut transport = transport()?;
    let outcome = transport
        .send_soap::<LogoutResponse, Infallible>(
            ProtocolMessage::structured(&request),
            &server.uri(),
            None,
            false,
            None,
        )
        .await?;

    assert_eq!(outcome, SoapOutcome::Rejected { status: 500 });
    Ok(())
}
