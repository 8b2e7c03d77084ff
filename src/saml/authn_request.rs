//! AuthnRequest construction.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::{
    constants::{ASSERTION_NS, BINDING_HTTP_POST, PROTOCOL_NS, SAML_VERSION},
    error::SamlResult,
    xml::XmlBuilder,
};
use crate::config::SamlSettings;

/// A serialized SAML `AuthnRequest`.
///
/// The `id` must be kept by the caller so the eventual response's
/// `InResponseTo` can be matched against it.
#[derive(Debug, Clone)]
pub struct AuthnRequest {
    /// Request ID (`_` followed by a random UUID).
    pub id: String,
    /// `IssueInstant` written on the request.
    pub issue_instant: DateTime<Utc>,
    /// Serialized XML document, including the XML declaration.
    pub xml: String,
}

impl AuthnRequest {
    /// Build an `AuthnRequest` from the SP settings.
    ///
    /// Optional elements are omitted when the corresponding setting is unset;
    /// this never fails because of missing configuration.
    pub fn build(settings: &SamlSettings) -> SamlResult<Self> {
        let id = generate_request_id();
        let issue_instant = Utc::now();
        let xml = Self::serialize(settings, &id, issue_instant)?;

        tracing::debug!(request_id = %id, xml_len = xml.len(), "Built SAML AuthnRequest");

        Ok(Self {
            id,
            issue_instant,
            xml,
        })
    }

    fn serialize(
        settings: &SamlSettings,
        id: &str,
        issue_instant: DateTime<Utc>,
    ) -> SamlResult<String> {
        let instant = format_instant(issue_instant);
        let consuming_index = settings.attribute_consuming_service_index.to_string();

        let mut attrs = vec![
            ("xmlns:saml2p", PROTOCOL_NS),
            ("ID", id),
            ("IssueInstant", instant.as_str()),
            ("Version", SAML_VERSION),
            ("ProtocolBinding", BINDING_HTTP_POST),
            ("AttributeConsumingServiceIndex", consuming_index.as_str()),
            ("ForceAuthn", "false"),
            ("IsPassive", "false"),
        ];
        if let Some(acs_url) = &settings.assertion_consumer_service_url {
            attrs.push(("AssertionConsumerServiceURL", acs_url.as_str()));
        }
        if let Some(destination) = &settings.destination_service_url {
            attrs.push(("Destination", destination.as_str()));
        }

        let mut xml = XmlBuilder::new(settings.pretty_print)?;
        xml.start("saml2p:AuthnRequest", &attrs)?;

        if let Some(issuer) = &settings.issuer {
            xml.text_element("saml2:Issuer", &[("xmlns:saml2", ASSERTION_NS)], issuer)?;
        }

        if let Some(format) = settings.name_identifier_format.first() {
            let mut policy = vec![("AllowCreate", "false"), ("Format", format.as_str())];
            if let Some(qualifier) = &settings.sp_name_qualifier {
                policy.push(("SPNameQualifier", qualifier.as_str()));
            }
            xml.empty("saml2p:NameIDPolicy", &policy)?;
        }

        if !settings.authn_context.is_empty() {
            xml.start("saml2p:RequestedAuthnContext", &[("Comparison", "exact")])?;
            for class_ref in &settings.authn_context {
                xml.text_element(
                    "saml2:AuthnContextClassRef",
                    &[("xmlns:saml2", ASSERTION_NS)],
                    class_ref,
                )?;
            }
            xml.end("saml2p:RequestedAuthnContext")?;
        }

        if !settings.requester_identifiers.is_empty() {
            xml.start("saml2p:Scoping", &[("ProxyCount", "1")])?;
            for requester in &settings.requester_identifiers {
                xml.text_element("saml2p:RequesterID", &[], requester)?;
            }
            xml.end("saml2p:Scoping")?;
        }

        xml.end("saml2p:AuthnRequest")?;
        xml.finish()
    }
}

/// `_`-prefixed request identifier. The prefix keeps the value a valid
/// `xs:ID` (which may not start with a digit).
fn generate_request_id() -> String {
    format!("_{}", Uuid::new_v4())
}

/// `YYYY-MM-DDThh:mm:ssZ`
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
