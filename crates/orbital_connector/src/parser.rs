//! Reply flattening.
//!
//! Replies are walked as a small element tree; only the leaves of the first `Response`
//! (or, failing that, `ErrorResponse`) element are kept, keyed by their snake cased name.

use std::collections::BTreeMap;

use error_stack::{report, ResultExt};
use once_cell::sync::Lazy;
use quick_xml::{events::Event, Reader};
use regex::Regex;
use serde::Serialize;

use crate::{
    consts,
    errors::{ConnectorError, CustomResult},
};

const RESPONSE_ELEMENT: &str = "Response";
const ERROR_RESPONSE_ELEMENT: &str = "ErrorResponse";

#[allow(clippy::expect_used)]
static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("acronym boundary pattern is valid"));
#[allow(clippy::expect_used)]
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("word boundary pattern is valid"));

/// Flat view of a processor reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParsedResponse(BTreeMap<String, String>);

impl ParsedResponse {
    /// Raw value of a field; an empty element yields `Some("")`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of a field, treating an empty element as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParsedResponse {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// First element with `name` in document order, this one included.
    fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    fn flatten_into(&self, fields: &mut BTreeMap<String, String>) {
        if self.children.is_empty() {
            fields.insert(underscore(&self.name), self.text.clone());
        } else {
            for child in &self.children {
                child.flatten_into(fields);
            }
        }
    }
}

/// Parses a raw reply. A reply without a `Response` or `ErrorResponse` element
/// yields an empty mapping; unreadable XML is an error.
pub fn parse(body: &[u8]) -> CustomResult<ParsedResponse, ConnectorError> {
    // Null characters show up in some replies, mostly in RespMsg.
    let body = String::from_utf8_lossy(body).replace('\u{0}', consts::NULL_PLACEHOLDER);
    let document = read_tree(&body)?;

    let root = document
        .iter()
        .find_map(|element| element.find(RESPONSE_ELEMENT))
        .or_else(|| {
            document
                .iter()
                .find_map(|element| element.find(ERROR_RESPONSE_ELEMENT))
        });

    let mut fields = BTreeMap::new();
    if let Some(root) = root {
        for child in &root.children {
            child.flatten_into(&mut fields);
        }
    }
    fields.retain(|key, _| !consts::SENSITIVE_FIELDS.contains(&key.as_str()));
    Ok(ParsedResponse(fields))
}

fn read_tree(body: &str) -> CustomResult<Vec<Element>, ConnectorError> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    loop {
        let event = reader
            .read_event()
            .change_context(ConnectorError::ResponseDeserializationFailed)
            .attach_printable_lazy(|| {
                format!("malformed reply at position {}", reader.buffer_position())
            })?;
        match event {
            Event::Start(start) => stack.push(Element {
                name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                ..Default::default()
            }),
            Event::Empty(empty) => attach(
                &mut stack,
                &mut roots,
                Element {
                    name: String::from_utf8_lossy(empty.local_name().as_ref()).into_owned(),
                    ..Default::default()
                },
            ),
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .change_context(ConnectorError::ResponseDeserializationFailed)?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    report!(ConnectorError::ResponseDeserializationFailed)
                        .attach_printable("closing tag without an opening tag")
                })?;
                attach(&mut stack, &mut roots, element);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }
    if !stack.is_empty() {
        return Err(report!(ConnectorError::ResponseDeserializationFailed))
            .attach_printable("reply ended inside an open element");
    }
    Ok(roots)
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// `RespCode` to `resp_code`, `CVV2RespCode` to `cvv2_resp_code`.
pub fn underscore(name: &str) -> String {
    let name = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    let name = WORD_BOUNDARY.replace_all(&name, "${1}_${2}");
    name.replace('-', "_").to_lowercase()
}
