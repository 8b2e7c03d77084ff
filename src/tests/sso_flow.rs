//! End-to-end service provider flows using wiremock.
//!
//! Each test stands up a mock IdP that publishes metadata with a chosen set of
//! bindings, then drives the `ServiceProvider` the way a web handler would.

use std::{
    io::{Read, Write},
    sync::Arc,
    time::Duration,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::read::DeflateDecoder;
use rstest::rstest;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::{
    config::SamlConfig,
    saml::{
        Binding, MemoryMetadataCache, MessageOptions, MetadataRetriever, OutboundMessage,
        SamlError, ServiceProvider, ServiceType,
        constants::{BINDING_HTTP_POST, BINDING_HTTP_REDIRECT},
    },
};

const SOAP: &str = "urn:oasis:names:tc:SAML:2.0:bindings:SOAP";
const CERT_BODY: &str = "MIICmzCCAYMCBgF4\n\t\tSIGNINGCERTBODY==";

/// Mock IdP publishing metadata at `/metadata`.
struct MockIdp {
    server: MockServer,
}

impl MockIdp {
    async fn start(sso_bindings: &[&str], slo_bindings: &[&str]) -> Self {
        Self::start_with_body(idp_metadata(sso_bindings, slo_bindings), None).await
    }

    async fn start_with_body(body: String, expected_fetches: Option<u64>) -> Self {
        let server = MockServer::start().await;
        let mock = Mock::given(method("GET"))
            .and(path("/metadata"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/samlmetadata+xml")
                    .set_body_string(body),
            );
        let mock = match expected_fetches {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(&server).await;
        Self { server }
    }

    fn metadata_url(&self) -> String {
        format!("{}/metadata", self.server.uri())
    }

    fn service_provider(&self) -> ServiceProvider {
        ServiceProvider::new(sp_config(&format!(
            "idp_metadata = \"{}\"",
            self.metadata_url()
        )))
        .unwrap()
    }
}

fn idp_metadata(sso_bindings: &[&str], slo_bindings: &[&str]) -> String {
    let services = |element: &str, bindings: &[&str]| -> String {
        bindings
            .iter()
            .map(|binding| {
                let suffix = binding.rsplit(':').next().unwrap_or_default();
                format!(
                    r#"    <md:{element} Binding="{binding}" Location="https://idp.example.com/{element}/{suffix}?tenant=acme"/>
"#
                )
            })
            .collect()
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" xmlns:xml="http://www.w3.org/XML/1998/namespace" xmlns:ds="http://www.w3.org/2000/09/xmldsig#" entityID="https://idp.example.com/saml">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:KeyDescriptor use="signing">
      <ds:KeyInfo><ds:X509Data><ds:X509Certificate>{CERT_BODY}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>
    </md:KeyDescriptor>
{slo}{sso}  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#,
        slo = services("SingleLogoutService", slo_bindings),
        sso = services("SingleSignOnService", sso_bindings),
    )
}

/// SP settings parsed from TOML, with `extra` appended to the `[saml]` table.
fn sp_config(extra: &str) -> crate::config::SamlSettings {
    let toml = format!(
        r#"
[saml]
issuer = "https://sp.example.com/saml"
assertion_consumer_service_url = "https://sp.example.com/saml/acs"
name_identifier_format = ["urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"]
authn_context = ["urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport"]
{extra}
"#
    );
    SamlConfig::from_str(&toml).unwrap().saml
}

fn inflate(encoded: &str) -> String {
    let compressed = STANDARD.decode(encoded).unwrap();
    let mut xml = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn form_value(html: &str, name: &str) -> String {
    let marker = format!(r#"name="{name}" value=""#);
    let start = html.find(&marker).expect("form field") + marker.len();
    let end = start + html[start..].find('"').expect("closing quote");
    html[start..end].to_string()
}

#[tokio::test]
async fn test_login_prefers_post_binding() {
    let idp = MockIdp::start(&[BINDING_HTTP_REDIRECT, BINDING_HTTP_POST], &[]).await;
    let sp = idp.service_provider();

    let (request, message) = sp
        .login(&MessageOptions::default())
        .await
        .unwrap()
        .expect("SSO endpoint");

    let OutboundMessage::Post { html } = message else {
        panic!("expected POST binding");
    };
    assert!(html.contains(
        r#"action="https://idp.example.com/SingleSignOnService/HTTP-POST?tenant=acme""#
    ));
    assert_eq!(form_value(&html, "RelayState"), "saml-sp");

    let posted = STANDARD.decode(form_value(&html, "SAMLRequest")).unwrap();
    assert_eq!(String::from_utf8(posted).unwrap(), request.xml);
    assert!(request.xml.contains(&format!(r#"ID="{}""#, request.id)));
}

#[tokio::test]
async fn test_login_redirect_roundtrip() {
    let idp = MockIdp::start(&[SOAP, BINDING_HTTP_REDIRECT], &[]).await;
    let sp = idp.service_provider();

    let (request, message) = sp
        .login(&MessageOptions::with_relay_state("/reports?page=2"))
        .await
        .unwrap()
        .unwrap();

    let OutboundMessage::Redirect { url } = message else {
        panic!("expected redirect binding");
    };
    let url = url::Url::parse(&url).unwrap();
    assert_eq!(
        url.path(),
        "/SingleSignOnService/HTTP-Redirect",
        "redirect endpoint from metadata"
    );

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs[0], ("tenant".to_string(), "acme".to_string()));
    assert_eq!(pairs[1].0, "SAMLRequest");
    assert_eq!(pairs[2], ("RelayState".to_string(), "/reports?page=2".to_string()));
    assert_eq!(inflate(&pairs[1].1), request.xml);
}

#[tokio::test]
async fn test_unsupported_bindings_yield_no_message() {
    let idp = MockIdp::start(&[SOAP], &[SOAP]).await;
    let sp = idp.service_provider();

    assert!(sp.login(&MessageOptions::default()).await.unwrap().is_none());
    assert!(
        sp.create_slo_request("<LogoutRequest/>", &MessageOptions::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[rstest]
#[case::post(&[BINDING_HTTP_POST], Binding::HttpPost)]
#[case::redirect(&[BINDING_HTTP_REDIRECT], Binding::HttpRedirect)]
#[case::both(&[BINDING_HTTP_REDIRECT, BINDING_HTTP_POST], Binding::HttpPost)]
#[tokio::test]
async fn test_slo_response_binding(#[case] slo_bindings: &[&str], #[case] expected: Binding) {
    let idp = MockIdp::start(&[BINDING_HTTP_POST], slo_bindings).await;
    let sp = idp.service_provider();

    let message = sp
        .create_slo_response("<samlp:LogoutResponse/>", &MessageOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(message.binding(), expected);
    match message {
        OutboundMessage::Redirect { url } => assert!(url.contains("SAMLResponse=")),
        OutboundMessage::Post { html } => assert!(html.contains(r#"name="SAMLResponse""#)),
    }
}

#[tokio::test]
async fn test_static_fallback_makes_no_requests() {
    let idp = MockIdp::start(&[BINDING_HTTP_POST], &[]).await;
    let sp = ServiceProvider::new(sp_config(
        r#"idp_sso_target_url = "https://static.example.com/sso""#,
    ))
    .unwrap();

    let (_, message) = sp.login(&MessageOptions::default()).await.unwrap().unwrap();

    assert!(matches!(
        message,
        OutboundMessage::Redirect { ref url } if url.starts_with("https://static.example.com/sso?SAMLRequest=")
    ));
    assert!(idp.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metadata_refetched_without_cache() {
    let idp = MockIdp::start_with_body(idp_metadata(&[BINDING_HTTP_POST], &[]), Some(2)).await;
    let sp = idp.service_provider();

    for _ in 0..2 {
        let endpoint = sp
            .resolve_endpoint(ServiceType::SingleSignOn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(endpoint.binding, Binding::HttpPost);
    }
    assert_eq!(idp.server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_attached_cache_fetches_once() {
    let idp = MockIdp::start_with_body(idp_metadata(&[BINDING_HTTP_POST], &[]), Some(1)).await;
    let settings = sp_config(&format!("idp_metadata = \"{}\"", idp.metadata_url()));
    let retriever = MetadataRetriever::new(&settings.metadata_fetch)
        .unwrap()
        .with_cache(Arc::new(MemoryMetadataCache::new(Duration::from_secs(300))));
    let sp = ServiceProvider::with_retriever(settings, retriever);

    for _ in 0..3 {
        let endpoint = sp
            .resolve_endpoint(ServiceType::SingleSignOn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(endpoint.binding, Binding::HttpPost);
    }
    assert!(sp.idp_certificate().await.unwrap().is_some());
    assert_eq!(idp.server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_configured_ttl_enables_cache() {
    let idp = MockIdp::start_with_body(idp_metadata(&[BINDING_HTTP_POST], &[]), Some(1)).await;
    let sp = ServiceProvider::new(sp_config(&format!(
        "idp_metadata = \"{}\"\nidp_metadata_ttl_secs = 300",
        idp.metadata_url()
    )))
    .unwrap();

    for _ in 0..2 {
        assert!(
            sp.resolve_endpoint(ServiceType::SingleSignOn)
                .await
                .unwrap()
                .is_some()
        );
    }
}

#[tokio::test]
async fn test_idp_certificate_extraction() {
    let idp = MockIdp::start(&[BINDING_HTTP_POST], &[]).await;
    let sp = idp.service_provider();

    let certificate = sp.idp_certificate().await.unwrap().unwrap();

    assert_eq!(certificate.as_str(), "MIICmzCCAYMCBgF4SIGNINGCERTBODY==");
    assert_eq!(
        sp.settings().idp_metadata.as_deref(),
        Some(idp.metadata_url().as_str()),
        "settings are not mutated"
    );
}

#[cfg(feature = "x509")]
#[tokio::test]
async fn test_idp_certificate_decodes_to_x509() {
    let (cert_pem, _) = super::generate_test_certificate();
    let body = crate::saml::strip_pem_headers(&cert_pem);
    let metadata = idp_metadata(&[BINDING_HTTP_POST], &[]).replace(CERT_BODY, &body);
    let idp = MockIdp::start_with_body(metadata, None).await;
    let sp = idp.service_provider();

    let x509 = sp.idp_certificate().await.unwrap().unwrap().to_x509().unwrap();

    let expected = openssl::x509::X509::from_pem(cert_pem.as_bytes()).unwrap();
    assert_eq!(x509.to_der().unwrap(), expected.to_der().unwrap());
}

#[tokio::test]
async fn test_metadata_without_certificate() {
    let metadata = idp_metadata(&[BINDING_HTTP_POST], &[])
        .replace(r#"use="signing""#, r#"use="encryption""#);
    let idp = MockIdp::start_with_body(metadata, None).await;
    let sp = idp.service_provider();

    assert!(matches!(
        sp.idp_certificate().await,
        Err(SamlError::MissingCertificate)
    ));
}

#[tokio::test]
async fn test_idp_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let sp = ServiceProvider::new(sp_config(&format!(
        "idp_metadata = \"{}/metadata\"",
        server.uri()
    )))
    .unwrap();

    let err = sp.login(&MessageOptions::default()).await.unwrap_err();
    assert!(matches!(err, SamlError::Retrieval(_)));
}

#[tokio::test]
async fn test_config_file_to_sp_metadata() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[saml]
issuer = "https://sp.example.com/saml"
assertion_consumer_service_url = "https://sp.example.com/saml/acs"
single_logout_service_url = "https://sp.example.com/saml/slo"
name_identifier_format = [
    "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
    "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress",
]
signing_certificate = """
-----BEGIN CERTIFICATE-----
MIIBkTCB+wIJAKHBfpegPjMCMA0GCSqGSIb3DQEBCwUAMBExDzANBgNVBAMMBnRl
-----END CERTIFICATE-----
"""
want_assertions_signed = false

[logging]
level = "debug"
"#
    )
    .unwrap();

    let config = SamlConfig::from_file(file.path()).unwrap();
    let sp = ServiceProvider::new(config.saml).unwrap();
    let xml = sp.sp_metadata().unwrap();

    assert!(xml.contains(r#"entityID="https://sp.example.com/saml""#));
    assert!(xml.contains(r#"WantAssertionsSigned="false""#));
    assert!(xml.contains(
        "<ds:X509Certificate>MIIBkTCB+wIJAKHBfpegPjMCMA0GCSqGSIb3DQEBCwUAMBExDzANBgNVBAMMBnRl</ds:X509Certificate>"
    ));
    assert_eq!(xml.matches("<md:SingleLogoutService").count(), 2);
    assert_eq!(xml.matches("<md:NameIDFormat>").count(), 2);

    // The published metadata is itself well-formed SAML metadata.
    let parsed = crate::saml::IdpMetadata::parse(&xml).unwrap();
    assert_eq!(parsed.entity_id.as_deref(), Some("https://sp.example.com/saml"));
}
