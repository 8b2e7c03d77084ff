//! Deterministic XML document writer shared by the request and metadata builders.

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::error::{SamlError, SamlResult};

/// Thin wrapper over `quick_xml::Writer` that always starts with an
/// `<?xml version="1.0" encoding="UTF-8"?>` declaration.
///
/// Attribute values and text are XML-escaped by quick-xml. Attributes are
/// written in the order given.
pub(crate) struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    pub fn new(pretty: bool) -> SamlResult<Self> {
        let writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        let mut builder = Self { writer };
        builder.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(builder)
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> SamlResult<()> {
        self.write(Event::Start(element(name, attrs)))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> SamlResult<()> {
        self.write(Event::Empty(element(name, attrs)))
    }

    /// `<name attrs>text</name>`
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> SamlResult<()> {
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    pub fn end(&mut self, name: &str) -> SamlResult<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    pub fn finish(self) -> SamlResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| SamlError::Xml(e.to_string()))
    }

    fn write(&mut self, event: Event<'_>) -> SamlResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| SamlError::Xml(e.to_string()))
    }
}

fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for &attr in attrs {
        start.push_attribute(attr);
    }
    start
}
