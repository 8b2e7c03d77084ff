//! Service provider metadata document.

use super::{
    certificate::{read_certificate_body, strip_pem_headers},
    constants::{
        BINDING_HTTP_POST, BINDING_HTTP_REDIRECT, METADATA_CACHE_DURATION, METADATA_NS,
        PROTOCOL_NS, XMLDSIG_NS,
    },
    error::{SamlError, SamlResult},
    xml::XmlBuilder,
};
use crate::config::SamlSettings;

/// The SP's own `md:EntityDescriptor`, ready to be served to IdPs.
#[derive(Debug, Clone)]
pub struct SpMetadata {
    pub entity_id: String,
    pub xml: String,
}

impl SpMetadata {
    /// Generate SP metadata from the settings.
    ///
    /// Children of `SPSSODescriptor` are written in schema order: signing key,
    /// logout services, NameID formats, then the assertion consumer service.
    /// Each is omitted when its setting is absent. The issuer is required
    /// because `entityID` is.
    pub fn generate(settings: &SamlSettings) -> SamlResult<Self> {
        let entity_id = settings.issuer.clone().ok_or_else(|| {
            SamlError::Configuration("issuer is required to generate SP metadata".to_string())
        })?;
        let certificate = signing_certificate_body(settings)?;
        let want_signed = if settings.want_assertions_signed {
            "true"
        } else {
            "false"
        };

        let mut xml = XmlBuilder::new(settings.pretty_print)?;
        xml.start(
            "md:EntityDescriptor",
            &[
                ("xmlns:md", METADATA_NS),
                ("entityID", entity_id.as_str()),
                ("cacheDuration", METADATA_CACHE_DURATION),
            ],
        )?;
        xml.start(
            "md:SPSSODescriptor",
            &[
                ("protocolSupportEnumeration", PROTOCOL_NS),
                ("WantAssertionsSigned", want_signed),
            ],
        )?;

        if let Some(certificate) = &certificate {
            xml.start("md:KeyDescriptor", &[("use", "signing")])?;
            xml.start("ds:KeyInfo", &[("xmlns:ds", XMLDSIG_NS)])?;
            xml.start("ds:X509Data", &[])?;
            xml.text_element("ds:X509Certificate", &[], certificate)?;
            xml.end("ds:X509Data")?;
            xml.end("ds:KeyInfo")?;
            xml.end("md:KeyDescriptor")?;
        }

        if let Some(slo_url) = &settings.single_logout_service_url {
            for binding in [BINDING_HTTP_REDIRECT, BINDING_HTTP_POST] {
                xml.empty(
                    "md:SingleLogoutService",
                    &[("Binding", binding), ("Location", slo_url.as_str())],
                )?;
            }
        }

        for format in &settings.name_identifier_format {
            xml.text_element("md:NameIDFormat", &[], format)?;
        }

        if let Some(acs_url) = &settings.assertion_consumer_service_url {
            xml.empty(
                "md:AssertionConsumerService",
                &[
                    ("Binding", BINDING_HTTP_POST),
                    ("Location", acs_url.as_str()),
                    ("index", "1"),
                ],
            )?;
        }

        xml.end("md:SPSSODescriptor")?;
        xml.end("md:EntityDescriptor")?;
        let xml = xml.finish()?;

        tracing::debug!(entity_id = %entity_id, "Generated SP metadata");

        Ok(Self { entity_id, xml })
    }
}

fn signing_certificate_body(settings: &SamlSettings) -> SamlResult<Option<String>> {
    if let Some(pem) = &settings.signing_certificate {
        let body = strip_pem_headers(pem);
        if body.is_empty() {
            return Err(SamlError::Certificate(
                "signing_certificate contains no certificate data".to_string(),
            ));
        }
        return Ok(Some(body));
    }

    settings
        .signing_certificate_path
        .as_deref()
        .map(read_certificate_body)
        .transpose()
}
