use crate::error::TimelineError;
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&OutlineNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a OutlineNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    // document order, `self` excluded
    pub fn find_descendant(&self, name: &str, attr: &str, value: &str) -> Option<&OutlineNode> {
        for child in &self.children {
            if child.name == name && child.attr(attr) == Some(value) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name, attr, value) {
                return Some(found);
            }
        }
        None
    }
}

fn malformed(source: &str, reason: impl Into<String>) -> TimelineError {
    TimelineError::MalformedDocument {
        file: source.to_string(),
        reason: reason.into(),
    }
}

fn node_from(
    start: &BytesStart<'_>,
    decoder: Decoder,
    source: &str,
) -> Result<OutlineNode, TimelineError> {
    let name = decoder
        .decode(start.local_name().as_ref())
        .map_err(|err| malformed(source, err.to_string()))?
        .into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| malformed(source, err.to_string()))?;
        let key = decoder
            .decode(attr.key.local_name().as_ref())
            .map_err(|err| malformed(source, err.to_string()))?
            .into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|err| malformed(source, format!("attribute `{key}` on <{name}>: {err}")))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(OutlineNode {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [OutlineNode],
    root: &mut Option<OutlineNode>,
    node: OutlineNode,
    source: &str,
) -> Result<(), TimelineError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(malformed(source, "more than one root element"));
    }
    *root = Some(node);
    Ok(())
}

/// Encoding comes from the BOM or the XML declaration, UTF-8 otherwise.
pub fn parse(xml: &[u8], source: &str) -> Result<OutlineNode, TimelineError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<OutlineNode> = Vec::new();
    let mut root: Option<OutlineNode> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(node_from(&e, reader.decoder(), source)?),
            Ok(Event::Empty(e)) => {
                let node = node_from(&e, reader.decoder(), source)?;
                attach(&mut stack, &mut root, node, source)?;
            }
            Ok(Event::End(_)) => {
                let Some(node) = stack.pop() else {
                    return Err(malformed(source, "unbalanced closing tag"));
                };
                attach(&mut stack, &mut root, node, source)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(malformed(
                    source,
                    format!("at byte {}: {err}", reader.buffer_position()),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(malformed(source, format!("<{}> is never closed", open.name)));
    }
    root.ok_or_else(|| malformed(source, "no root element"))
}
