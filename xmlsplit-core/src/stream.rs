//! Forward-only stream of repeating-element occurrences
//!
//! [`ElementStream`] wraps a quick-xml [`Reader`] and yields one
//! [`SerializedElement`] per completed occurrence of the configured element,
//! in document order. Nothing but the occurrence currently being captured is
//! held in memory; once yielded, the bytes belong to the caller.
//!
//! The stream is finite and cannot be replayed. After the end of input or
//! the first error it only returns `None`.

use crate::error::{Result, SplitError};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::io::BufRead;
use std::iter::FusedIterator;

/// One occurrence of the repeating element, serialized with its subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedElement {
    ordinal: usize,
    bytes: Vec<u8>,
}

impl SerializedElement {
    /// 1-based position of this occurrence in the document
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Serialized bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Serialized length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the serialization is empty (never true for parsed elements)
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take ownership of the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for SerializedElement {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A namespace declaration (`xmlns` or `xmlns:prefix`) as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    prefix: Option<Vec<u8>>,
    value: Vec<u8>,
}

impl NamespaceDecl {
    /// Declared prefix, `None` for the default namespace
    pub fn prefix(&self) -> Option<&[u8]> {
        self.prefix.as_deref()
    }

    /// Namespace URI, still escaped as in the source
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Append ` xmlns[:prefix]="value"` to `out`
    pub fn write_attribute(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b" xmlns");
        if let Some(prefix) = &self.prefix {
            out.push(b':');
            out.extend_from_slice(prefix);
        }
        out.extend_from_slice(b"=\"");
        for &byte in &self.value {
            if byte == b'"' {
                out.extend_from_slice(b"&quot;");
            } else {
                out.push(byte);
            }
        }
        out.push(b'"');
    }
}

/// Name and namespace declarations of the document element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    name: Vec<u8>,
    namespaces: Vec<NamespaceDecl>,
}

impl SourceRoot {
    /// Qualified name of the document element
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Namespace declarations carried by the document element
    pub fn namespaces(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }
}

/// Decides which elements are occurrences of the repeating element.
///
/// A name with a prefix (`wd:Worker`) must match the qualified name exactly;
/// a bare name (`Worker`) matches the local name under any prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ElementMatcher {
    Qualified(Vec<u8>),
    Local(Vec<u8>),
}

impl ElementMatcher {
    fn new(name: &str) -> Self {
        if name.contains(':') {
            ElementMatcher::Qualified(name.as_bytes().to_vec())
        } else {
            ElementMatcher::Local(name.as_bytes().to_vec())
        }
    }

    fn matches(&self, name: QName<'_>) -> bool {
        match self {
            ElementMatcher::Qualified(target) => name.as_ref() == target.as_slice(),
            ElementMatcher::Local(target) => name.local_name().as_ref() == target.as_slice(),
        }
    }
}

/// Occurrence currently being serialized
#[derive(Debug)]
struct Capture {
    name: Vec<u8>,
    start: Vec<u8>,
    self_closing: bool,
    declared: Vec<Option<Vec<u8>>>,
    body: Vec<u8>,
    depth: usize,
}

impl Capture {
    fn begin(e: &BytesStart<'_>, self_closing: bool) -> std::result::Result<Self, AttrError> {
        Ok(Capture {
            name: e.name().as_ref().to_vec(),
            start: e.to_vec(),
            self_closing,
            declared: namespace_decls(e)?.into_iter().map(|d| d.prefix).collect(),
            body: Vec::new(),
            depth: if self_closing { 0 } else { 1 },
        })
    }

    fn declares(&self, prefix: Option<&[u8]>) -> bool {
        self.declared.iter().any(|d| d.as_deref() == prefix)
    }

    fn push_markup(&mut self, open: &[u8], content: &[u8], close: &[u8]) {
        self.body.extend_from_slice(open);
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(close);
    }
}

fn namespace_decls(e: &BytesStart<'_>) -> std::result::Result<Vec<NamespaceDecl>, AttrError> {
    let mut decls = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" {
            decls.push(NamespaceDecl {
                prefix: None,
                value: attr.value.to_vec(),
            });
        } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            decls.push(NamespaceDecl {
                prefix: Some(prefix.to_vec()),
                value: attr.value.to_vec(),
            });
        }
    }
    Ok(decls)
}

enum Step {
    Continue,
    Element(SerializedElement),
    Done,
}

/// Streaming producer of repeating-element occurrences
pub struct ElementStream<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    matcher: ElementMatcher,
    source_name: String,
    scopes: Vec<Vec<NamespaceDecl>>,
    encoding: Option<Vec<u8>>,
    root: Option<SourceRoot>,
    root_seen: bool,
    capture: Option<Capture>,
    emitted: usize,
    finished: bool,
}

impl<R: BufRead> ElementStream<R> {
    /// Stream occurrences of `element` from `reader`.
    ///
    /// `source_name` labels parser errors (usually the input path).
    pub fn new(reader: R, element: &str, source_name: impl Into<String>) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            matcher: ElementMatcher::new(element),
            source_name: source_name.into(),
            scopes: Vec::new(),
            encoding: None,
            root: None,
            root_seen: false,
            capture: None,
            emitted: 0,
            finished: false,
        }
    }

    /// The document element, once the parser has passed its start tag.
    ///
    /// `None` before that, and when the document element is itself an
    /// occurrence of the repeating element.
    pub fn root(&self) -> Option<&SourceRoot> {
        self.root.as_ref()
    }

    /// Encoding named by the source's XML declaration, if it names one.
    ///
    /// Occurrences are passed through as raw bytes, so chunks that carry
    /// their own declaration must repeat this encoding.
    pub fn declared_encoding(&self) -> Option<&[u8]> {
        self.encoding.as_deref()
    }

    /// Occurrences yielded so far
    pub fn elements_emitted(&self) -> usize {
        self.emitted
    }

    /// Label used in error messages
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Advance to the next completed occurrence
    pub fn next_element(&mut self) -> Result<Option<SerializedElement>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = std::mem::take(&mut self.buf);
        let result = loop {
            buf.clear();
            match self.step(&mut buf) {
                Ok(Step::Continue) => continue,
                Ok(Step::Element(element)) => break Ok(Some(element)),
                Ok(Step::Done) => break Ok(None),
                Err(e) => break Err(e),
            }
        };
        self.buf = buf;

        if result.is_err() {
            self.finished = true;
            self.capture = None;
        }
        result
    }

    fn step(&mut self, buf: &mut Vec<u8>) -> Result<Step> {
        let event = self
            .reader
            .read_event_into(buf)
            .map_err(|e| self.malformed(e.to_string()))?;

        match event {
            Event::Start(e) => self.on_start(&e, false),
            Event::Empty(e) => self.on_start(&e, true),
            Event::End(e) => Ok(self.on_end(e.name().as_ref())),
            Event::Text(e) => Ok(self.on_markup(b"", &e, b"")),
            Event::CData(e) => Ok(self.on_markup(b"<![CDATA[", &e, b"]]>")),
            Event::Comment(e) => Ok(self.on_markup(b"<!--", &e, b"-->")),
            Event::PI(e) => Ok(self.on_markup(b"<?", &e, b"?>")),
            // Only legal in the prolog, never inside an occurrence
            Event::Decl(e) => self.on_decl(&e),
            Event::DocType(_) => Ok(Step::Continue),
            Event::Eof => self.on_eof(),
        }
    }

    fn on_decl(&mut self, decl: &BytesDecl<'_>) -> Result<Step> {
        if let Some(encoding) = decl.encoding() {
            let encoding = encoding.map_err(|err| self.malformed(err.to_string()))?;
            self.encoding = Some(encoding.into_owned());
        }
        Ok(Step::Continue)
    }

    fn on_start(&mut self, e: &BytesStart<'_>, self_closing: bool) -> Result<Step> {
        if let Some(capture) = self.capture.as_mut() {
            let close: &[u8] = if self_closing { b"/>" } else { b">" };
            capture.push_markup(b"<", e, close);
            if !self_closing {
                capture.depth += 1;
            }
            return Ok(Step::Continue);
        }

        let is_root = !self.root_seen;
        self.root_seen = true;

        if self.matcher.matches(e.name()) {
            let capture =
                Capture::begin(e, self_closing).map_err(|err| self.malformed(err.to_string()))?;
            if self_closing {
                return Ok(Step::Element(self.finish(capture)));
            }
            self.capture = Some(capture);
            return Ok(Step::Continue);
        }

        let decls = namespace_decls(e).map_err(|err| self.malformed(err.to_string()))?;
        if is_root {
            self.root = Some(SourceRoot {
                name: e.name().as_ref().to_vec(),
                namespaces: decls.clone(),
            });
        }
        if !self_closing {
            self.scopes.push(decls);
        }
        Ok(Step::Continue)
    }

    fn on_end(&mut self, name: &[u8]) -> Step {
        match self.capture.take() {
            Some(mut capture) => {
                capture.push_markup(b"</", name, b">");
                capture.depth -= 1;
                if capture.depth == 0 {
                    Step::Element(self.finish(capture))
                } else {
                    self.capture = Some(capture);
                    Step::Continue
                }
            }
            None => {
                self.scopes.pop();
                Step::Continue
            }
        }
    }

    fn on_markup(&mut self, open: &[u8], content: &[u8], close: &[u8]) -> Step {
        if let Some(capture) = self.capture.as_mut() {
            capture.push_markup(open, content, close);
        }
        Step::Continue
    }

    fn on_eof(&mut self) -> Result<Step> {
        self.finished = true;

        if let Some(capture) = &self.capture {
            return Err(self.malformed(format!(
                "unexpected end of document inside <{}>",
                String::from_utf8_lossy(&capture.name)
            )));
        }
        if !self.scopes.is_empty() {
            return Err(self.malformed(format!(
                "unexpected end of document with {} unclosed element(s)",
                self.scopes.len()
            )));
        }
        if !self.root_seen {
            return Err(self.malformed("document has no root element".to_string()));
        }
        Ok(Step::Done)
    }

    /// Assemble the occurrence, redeclaring every namespace it inherits.
    ///
    /// Prefixes may be used inside attribute values and text (`xsi:type`
    /// values, XPath in payloads), so all bindings in scope are carried,
    /// not only those used in names.
    fn finish(&mut self, capture: Capture) -> SerializedElement {
        let mut bytes = Vec::with_capacity(capture.start.len() + capture.body.len() + 3);
        bytes.push(b'<');
        bytes.extend_from_slice(&capture.start);

        for decl in self.inherited() {
            if capture.declares(decl.prefix()) {
                continue;
            }
            // `xmlns=""` undeclares the default namespace, nothing to carry
            if decl.prefix.is_none() && decl.value.is_empty() {
                continue;
            }
            decl.write_attribute(&mut bytes);
        }

        if capture.self_closing {
            bytes.extend_from_slice(b"/>");
        } else {
            bytes.push(b'>');
            bytes.extend_from_slice(&capture.body);
        }

        self.emitted += 1;
        SerializedElement {
            ordinal: self.emitted,
            bytes,
        }
    }

    /// Nearest binding of every prefix in scope, in order of first declaration
    fn inherited(&self) -> Vec<&NamespaceDecl> {
        let mut bindings: Vec<&NamespaceDecl> = Vec::new();
        for decl in self.scopes.iter().flatten() {
            match bindings.iter_mut().find(|b| b.prefix == decl.prefix) {
                Some(slot) => *slot = decl,
                None => bindings.push(decl),
            }
        }
        bindings
    }

    fn malformed(&self, message: String) -> SplitError {
        SplitError::MalformedSource {
            source_name: self.source_name.clone(),
            position: self.reader.buffer_position(),
            message,
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<SerializedElement>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}

impl<R: BufRead> FusedIterator for ElementStream<R> {}
