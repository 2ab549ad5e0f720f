//! Ordered, append-only request document.
//!
//! The processor reads several tag families positionally, so the document is a flat
//! list of nodes in emission order. Nothing is ever inserted before an existing node.

use std::borrow::Cow;

use error_stack::ResultExt;
use masking::{Maskable, PeekInterface, Secret};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{
    consts,
    errors::{ConnectorError, CustomResult},
};

pub const ROOT_ELEMENT: &str = "Request";

/// Operation wrapped by the `Request` root.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::AsRefStr)]
pub enum OperationKind {
    NewOrder,
    MarkForCapture,
    Reversal,
    Profile,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeContent {
    /// `None` renders as an empty element, which the processor reads as "not supplied".
    Text(Option<Maskable<String>>),
    Children(Vec<Node>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: Cow<'static, str>,
    pub content: NodeContent,
}

impl Node {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text(Some(Maskable::Normal(value))) => Some(value.as_str()),
            NodeContent::Text(Some(Maskable::Masked(value))) => Some(value.peek().as_str()),
            NodeContent::Text(None) | NodeContent::Children(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.content {
            NodeContent::Children(children) => children,
            NodeContent::Text(_) => &[],
        }
    }
}

/// Append-only list of sibling nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeList {
    nodes: Vec<Node>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tag with a value.
    pub fn tag(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        self.push(name, Some(Maskable::new_normal(value.into())));
    }

    /// Appends a tag whose body must never show up in logs.
    pub fn secret_tag(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        self.push(name, Some(Maskable::new_masked(Secret::new(value.into()))));
    }

    /// Appends a tag that is rendered empty when the value is absent.
    pub fn nullable_tag(&mut self, name: impl Into<Cow<'static, str>>, value: Option<impl Into<String>>) {
        self.push(name, value.map(|value| Maskable::new_normal(value.into())));
    }

    pub fn nullable_secret_tag(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: Option<impl Into<String>>,
    ) {
        self.push(
            name,
            value.map(|value| Maskable::new_masked(Secret::new(value.into()))),
        );
    }

    /// Appends a tag only when the value is present.
    pub fn optional_tag(&mut self, name: impl Into<Cow<'static, str>>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.tag(name, value);
        }
    }

    /// Appends a nested element whose children are built by `build`.
    pub fn group<F>(&mut self, name: impl Into<Cow<'static, str>>, build: F) -> CustomResult<(), ConnectorError>
    where
        F: FnOnce(&mut Self) -> CustomResult<(), ConnectorError>,
    {
        let mut children = Self::new();
        build(&mut children)?;
        self.nodes.push(Node {
            name: name.into(),
            content: NodeContent::Children(children.nodes),
        });
        Ok(())
    }

    fn push(&mut self, name: impl Into<Cow<'static, str>>, value: Option<Maskable<String>>) {
        self.nodes.push(Node {
            name: name.into(),
            content: NodeContent::Text(value),
        });
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of the direct children in emission order.
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name.as_ref()).collect()
    }

    /// First direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }
}

/// A complete `<Request>` document for one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDocument {
    pub operation: OperationKind,
    pub body: NodeList,
}

impl RequestDocument {
    pub fn new(operation: OperationKind, body: NodeList) -> Self {
        Self { operation, body }
    }

    /// Serializes to the UTF-8 wire form, indented by two spaces.
    pub fn to_xml_bytes(&self) -> CustomResult<Vec<u8>, ConnectorError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new(
                consts::XML_VERSION,
                Some(consts::XML_ENCODING),
                None,
            )))
            .change_context(ConnectorError::RequestEncodingFailed)?;
        write_start(&mut writer, ROOT_ELEMENT)?;
        write_start(&mut writer, self.operation.as_ref())?;
        for node in self.body.nodes() {
            write_node(&mut writer, node)?;
        }
        write_end(&mut writer, self.operation.as_ref())?;
        write_end(&mut writer, ROOT_ELEMENT)?;
        Ok(writer.into_inner())
    }

    pub fn to_xml_string(&self) -> CustomResult<String, ConnectorError> {
        String::from_utf8(self.to_xml_bytes()?)
            .change_context(ConnectorError::RequestEncodingFailed)
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> CustomResult<(), ConnectorError> {
    match &node.content {
        NodeContent::Children(children) => {
            write_start(writer, &node.name)?;
            for child in children {
                write_node(writer, child)?;
            }
            write_end(writer, &node.name)
        }
        NodeContent::Text(None) => writer
            .write_event(Event::Empty(BytesStart::new(node.name.as_ref())))
            .change_context(ConnectorError::RequestEncodingFailed)
            .attach_printable_lazy(|| format!("failed to write <{}/>", node.name)),
        NodeContent::Text(Some(_)) => {
            write_start(writer, &node.name)?;
            writer
                .write_event(Event::Text(BytesText::new(node.text().unwrap_or_default())))
                .change_context(ConnectorError::RequestEncodingFailed)
                .attach_printable_lazy(|| format!("failed to write body of <{}>", node.name))?;
            write_end(writer, &node.name)
        }
    }
}

fn write_start(writer: &mut Writer<Vec<u8>>, name: &str) -> CustomResult<(), ConnectorError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .change_context(ConnectorError::RequestEncodingFailed)
        .attach_printable_lazy(|| format!("failed to open <{name}>"))
}

fn write_end(writer: &mut Writer<Vec<u8>>, name: &str) -> CustomResult<(), ConnectorError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .change_context(ConnectorError::RequestEncodingFailed)
        .attach_printable_lazy(|| format!("failed to close <{name}>"))
}
