//! Identity provider metadata parsing.
//!
//! Only the parts of an `EntityDescriptor` the service provider acts on are
//! kept: the entity ID, the SSO and SLO service endpoints of the
//! `IDPSSODescriptor`, and its key descriptors.
//!
//! Two document shapes are recognised. The usual one has every element on the
//! `EntityDescriptor/IDPSSODescriptor/...` path in the SAML metadata namespace
//! (prefixed or through a default namespace). Some IdPs publish the same path
//! with no namespace at all. Paths that mix the two, or use any other
//! namespace, are ignored. `KeyInfo` and its children must always be in the
//! XML-DSig namespace.

use quick_xml::{
    NsReader,
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
};

use super::{
    binding::{Binding, ServiceType},
    certificate::IdpCertificate,
    constants::{METADATA_NS, XMLDSIG_NS},
    error::{SamlError, SamlResult},
};

/// A service endpoint advertised by the IdP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Binding URI, exactly as published.
    pub binding: String,
    pub location: String,
    /// Whether the element was found on the metadata-namespaced path.
    pub namespaced: bool,
}

/// A `KeyDescriptor` that carries an `X509Certificate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// The `use` attribute (`signing`, `encryption`), if present.
    pub usage: Option<String>,
    /// Raw certificate element text.
    pub certificate: String,
    pub namespaced: bool,
}

/// Parsed IdP metadata. Transient; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdpMetadata {
    pub entity_id: Option<String>,
    pub sso_services: Vec<Endpoint>,
    pub slo_services: Vec<Endpoint>,
    pub key_descriptors: Vec<KeyDescriptor>,
}

impl IdpMetadata {
    /// Parse an `EntityDescriptor` document.
    ///
    /// Fails with [`SamlError::Parse`] on malformed XML or when the root element
    /// is not an `EntityDescriptor`.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let mut parser = Parser::default();
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            let position = reader.buffer_position();
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| SamlError::Parse(format!("at byte {position}: {e}")))?;
            let ns = Ns::from(&ns);

            match event {
                Event::Start(e) => {
                    let node = parser.open(ns, &e)?;
                    parser.stack.push(node);
                }
                Event::Empty(e) => {
                    let node = parser.open(ns, &e)?;
                    parser.close(&node);
                }
                Event::End(_) => {
                    if let Some(node) = parser.stack.pop() {
                        parser.close(&node);
                    }
                }
                Event::Text(text) => {
                    if let Some(buffer) = parser.certificate_text.as_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| SamlError::Parse(e.to_string()))?;
                        buffer.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(buffer) = parser.certificate_text.as_mut() {
                        buffer.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !parser.seen_root {
            return Err(SamlError::Parse("document has no root element".to_string()));
        }
        if !parser.stack.is_empty() {
            return Err(SamlError::Parse("unexpected end of document".to_string()));
        }

        Ok(parser.metadata)
    }

    /// Endpoints published for a service, in document order.
    pub fn services(&self, service: ServiceType) -> &[Endpoint] {
        match service {
            ServiceType::SingleSignOn => &self.sso_services,
            ServiceType::SingleLogout => &self.slo_services,
        }
    }

    /// First endpoint of `service` published with `binding`.
    pub fn endpoint(&self, service: ServiceType, binding: Binding) -> Option<&Endpoint> {
        self.services(service)
            .iter()
            .find(|endpoint| endpoint.binding == binding.uri())
    }

    /// Extract the IdP signing certificate.
    ///
    /// Key descriptors whose `use` is `signing` or absent qualify. The
    /// namespaced path wins over the unnamespaced one.
    pub fn signing_certificate(&self) -> SamlResult<IdpCertificate> {
        let signing = || {
            self.key_descriptors
                .iter()
                .filter(|key| key.usage.as_deref().is_none_or(|usage| usage == "signing"))
        };

        signing()
            .find(|key| key.namespaced)
            .or_else(|| signing().find(|key| !key.namespaced))
            .map(|key| IdpCertificate::from_element_text(&key.certificate))
            .ok_or(SamlError::MissingCertificate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Metadata,
    DSig,
    None,
    Other,
}

impl From<&ResolveResult<'_>> for Ns {
    fn from(result: &ResolveResult<'_>) -> Self {
        match result {
            ResolveResult::Unbound => Ns::None,
            ResolveResult::Bound(Namespace(ns)) if *ns == METADATA_NS.as_bytes() => Ns::Metadata,
            ResolveResult::Bound(Namespace(ns)) if *ns == XMLDSIG_NS.as_bytes() => Ns::DSig,
            _ => Ns::Other,
        }
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    ns: Ns,
}

impl Node {
    fn is(&self, name: &str) -> bool {
        self.name == name
    }

    fn is_dsig(&self, name: &str) -> bool {
        self.ns == Ns::DSig && self.name == name
    }
}

/// `Some(true)` when every node is in the metadata namespace, `Some(false)`
/// when none has a namespace.
fn metadata_path(nodes: &[&Node]) -> Option<bool> {
    if nodes.iter().all(|node| node.ns == Ns::Metadata) {
        Some(true)
    } else if nodes.iter().all(|node| node.ns == Ns::None) {
        Some(false)
    } else {
        None
    }
}

#[derive(Default)]
struct Parser {
    stack: Vec<Node>,
    metadata: IdpMetadata,
    seen_root: bool,
    key: Option<(Option<String>, bool)>,
    key_certificate: Option<String>,
    certificate_text: Option<String>,
}

impl Parser {
    fn open(&mut self, ns: Ns, element: &BytesStart<'_>) -> SamlResult<Node> {
        let node = Node {
            name: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
            ns,
        };

        if !self.seen_root {
            if !node.is("EntityDescriptor") {
                return Err(SamlError::Parse(format!(
                    "root element is {}, expected EntityDescriptor",
                    node.name
                )));
            }
            self.seen_root = true;
            self.metadata.entity_id = attribute(element, "entityID")?;
            return Ok(node);
        }

        match self.stack.as_slice() {
            [root, descriptor] if descriptor.is("IDPSSODescriptor") => {
                let Some(namespaced) = metadata_path(&[root, descriptor, &node]) else {
                    return Ok(node);
                };
                let services = match node.name.as_str() {
                    "SingleSignOnService" => Some(&mut self.metadata.sso_services),
                    "SingleLogoutService" => Some(&mut self.metadata.slo_services),
                    "KeyDescriptor" => {
                        self.key = Some((attribute(element, "use")?, namespaced));
                        self.key_certificate = None;
                        None
                    }
                    _ => None,
                };
                if let Some(services) = services
                    && let (Some(binding), Some(location)) =
                        (attribute(element, "Binding")?, attribute(element, "Location")?)
                {
                    services.push(Endpoint {
                        binding,
                        location,
                        namespaced,
                    });
                }
            }
            [_, _, key_descriptor, key_info, x509_data]
                if self.key.is_some()
                    && key_descriptor.is("KeyDescriptor")
                    && key_info.is_dsig("KeyInfo")
                    && x509_data.is_dsig("X509Data")
                    && node.is_dsig("X509Certificate") =>
            {
                self.certificate_text = Some(String::new());
            }
            _ => {}
        }

        Ok(node)
    }

    /// Called with the element just closed; `self.stack` holds its ancestors.
    fn close(&mut self, node: &Node) {
        if node.is_dsig("X509Certificate")
            && let Some(text) = self.certificate_text.take()
            && !text.is_empty()
            && self.key_certificate.is_none()
        {
            self.key_certificate = Some(text);
        }

        if self.stack.len() == 2
            && node.is("KeyDescriptor")
            && let Some((usage, namespaced)) = self.key.take()
            && let Some(certificate) = self.key_certificate.take()
        {
            self.metadata.key_descriptors.push(KeyDescriptor {
                usage,
                certificate,
                namespaced,
            });
        }
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> SamlResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SamlError::Parse(e.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| SamlError::Parse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
