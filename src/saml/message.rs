//! Outbound message assembly for the redirect and POST bindings.

use std::fmt::Write;

use quick_xml::escape::escape;
use url::{Url, form_urlencoded};

use super::{
    binding::{Binding, ResolvedEndpoint},
    constants::DEFAULT_RELAY_STATE,
    encoding,
    error::{SamlError, SamlResult},
};

/// Whether the message is a request or a response, which decides the name of
/// the parameter that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

impl MessageKind {
    pub fn param(self) -> &'static str {
        match self {
            MessageKind::Request => "SAMLRequest",
            MessageKind::Response => "SAMLResponse",
        }
    }
}

/// Caller-supplied parameters sent alongside the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    /// RelayState to send. POST forms fall back to a fixed value when unset;
    /// redirect URLs omit the parameter.
    pub relay_state: Option<String>,
    /// Additional parameters, in order.
    pub extra_parameters: Vec<(String, String)>,
}

impl MessageOptions {
    pub fn with_relay_state(relay_state: impl Into<String>) -> Self {
        Self {
            relay_state: Some(relay_state.into()),
            ..Default::default()
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_parameters.push((name.into(), value.into()));
        self
    }
}

/// Transport artifact handed to the web layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Send the user agent a redirect to this URL.
    Redirect { url: String },
    /// Render this HTML page; it posts itself to the IdP on load.
    Post { html: String },
}

impl OutboundMessage {
    pub fn binding(&self) -> Binding {
        match self {
            OutboundMessage::Redirect { .. } => Binding::HttpRedirect,
            OutboundMessage::Post { .. } => Binding::HttpPost,
        }
    }
}

/// Encode `xml` for the endpoint's binding and wrap it in the matching artifact.
pub fn assemble(
    endpoint: &ResolvedEndpoint,
    kind: MessageKind,
    xml: &str,
    options: &MessageOptions,
) -> SamlResult<OutboundMessage> {
    match endpoint.binding {
        Binding::HttpRedirect => Ok(OutboundMessage::Redirect {
            url: redirect_url(&endpoint.url, kind, xml, options)?,
        }),
        Binding::HttpPost => Ok(OutboundMessage::Post {
            html: post_form(&endpoint.url, kind, xml, options),
        }),
    }
}

/// Build the HTTP-Redirect URL for a message.
///
/// Parameters are appended after the endpoint's own query string, which is
/// kept verbatim. A parameter is skipped when its name is already present,
/// so the endpoint's parameters take precedence, then the message, then
/// RelayState, then the extra parameters.
pub fn redirect_url(
    endpoint: &str,
    kind: MessageKind,
    xml: &str,
    options: &MessageOptions,
) -> SamlResult<String> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| SamlError::Configuration(format!("Invalid IdP endpoint {endpoint}: {e}")))?;
    let encoded = encoding::deflate_encode(xml)?;

    let mut names: Vec<String> = url.query_pairs().map(|(name, _)| name.into_owned()).collect();
    let mut appended = form_urlencoded::Serializer::new(String::new());
    let mut append = |name: &str, value: &str| {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
            appended.append_pair(name, value);
        }
    };

    append(kind.param(), &encoded);
    if let Some(relay_state) = &options.relay_state {
        append("RelayState", relay_state);
    }
    for (name, value) in &options.extra_parameters {
        append(name, value);
    }

    let appended = appended.finish();
    let query = match url.query() {
        Some(existing) if !existing.is_empty() && !appended.is_empty() => {
            format!("{existing}&{appended}")
        }
        Some(existing) if !existing.is_empty() => existing.to_string(),
        _ => appended,
    };
    url.set_query(Some(&query));

    Ok(url.into())
}

/// Build the self-submitting HTML form for the HTTP-POST binding.
///
/// All inserted values are HTML-escaped. Extra parameters that reuse the
/// RelayState or message parameter name are dropped.
pub fn post_form(endpoint: &str, kind: MessageKind, xml: &str, options: &MessageOptions) -> String {
    let encoded = encoding::base64_encode(xml);
    let relay_state = options.relay_state.as_deref().unwrap_or(DEFAULT_RELAY_STATE);

    let mut html = String::from(
        "<html><body onload=\"document.getElementById('saml-form').submit();\">\n",
    );
    // Writing into a String cannot fail.
    let _ = writeln!(
        html,
        "<form id=\"saml-form\" method=\"POST\" action=\"{}\">",
        escape(endpoint)
    );
    hidden_input(&mut html, "RelayState", relay_state);
    hidden_input(&mut html, kind.param(), &encoded);
    for (name, value) in &options.extra_parameters {
        if name == "RelayState" || name == kind.param() {
            continue;
        }
        hidden_input(&mut html, name, value);
    }
    html.push_str("<noscript><input type=\"submit\" value=\"Continue\"/></noscript>\n");
    html.push_str("</form></body></html>\n");
    html
}

fn hidden_input(html: &mut String, name: &str, value: &str) {
    let _ = writeln!(
        html,
        "<input type=\"hidden\" name=\"{}\" value=\"{}\"/>",
        escape(name),
        escape(value)
    );
}
