//! HTML parser.
//!
//! Drives the tokenizer and builds nodes directly into a [`Document`].
//! The same parser fills a fresh document or appends a fragment under an
//! existing element (used by `p-html`).

use pattr_carton::{is_void_tag, CompactString};
use pattr_relief::{Attribute, Document, ErrorCode, NodeId, ParseError};

use crate::tokenizer::{Callbacks, QuoteType, Tokenizer};

/// Parser context for building the tree
struct Parser<'a, 'd> {
    /// Source code
    source: &'a str,
    /// Target document
    doc: &'d mut Document,
    /// Node new top-level nodes are appended to
    base: NodeId,
    /// Open element stack
    stack: Vec<NodeId>,
    /// Element whose start tag is being read
    current_element: Option<NodeId>,
    /// Attribute being read: (name, value)
    current_attr: Option<(CompactString, String)>,
    /// Errors collected during parsing
    errors: Vec<ParseError>,
}

impl<'a, 'd> Parser<'a, 'd> {
    fn new(source: &'a str, doc: &'d mut Document, base: NodeId) -> Self {
        Self {
            source,
            doc,
            base,
            stack: Vec::new(),
            current_element: None,
            current_attr: None,
            errors: Vec::new(),
        }
    }

    /// Get source slice
    fn get_source(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    #[inline]
    fn current_parent(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.base)
    }

    fn add_child(&mut self, child: NodeId) {
        let parent = self.current_parent();
        self.doc.append_child(parent, child);
    }

    /// Attach the element whose start tag just ended
    fn finish_open_tag(&mut self, self_closing: bool) {
        if let Some(element) = self.current_element.take() {
            self.add_child(element);
            let is_void = self.doc.tag(element).is_some_and(is_void_tag);
            if !self_closing && !is_void {
                self.stack.push(element);
            }
        }
    }

    /// Handle unclosed elements at end of parsing
    fn handle_unclosed_elements(&mut self) {
        while self.stack.pop().is_some() {
            self.errors
                .push(ParseError::new(ErrorCode::MissingEndTag, self.source.len()));
        }
    }
}

impl Callbacks for Parser<'_, '_> {
    fn on_text(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = htmlize::unescape(self.get_source(start, end));
        let node = self.doc.create_text(text.into_owned());
        self.add_child(node);
    }

    fn on_raw_text(&mut self, start: usize, end: usize) {
        let node = self.doc.create_text(self.get_source(start, end));
        self.add_child(node);
    }

    fn on_open_tag_name(&mut self, start: usize, end: usize) {
        let tag = self.get_source(start, end).to_ascii_lowercase();
        self.current_element = Some(self.doc.create_element(tag));
    }

    fn on_open_tag_end(&mut self, _end: usize) {
        self.finish_open_tag(false);
    }

    fn on_self_closing_tag(&mut self, _end: usize) {
        self.finish_open_tag(true);
    }

    fn on_close_tag(&mut self, start: usize, end: usize) {
        let tag = self.get_source(start, end);

        // Find matching open tag
        let position = self.stack.iter().rposition(|open| {
            self.doc
                .tag(*open)
                .is_some_and(|open_tag| open_tag.eq_ignore_ascii_case(tag))
        });

        match position {
            Some(i) => {
                // Everything opened after the match is implicitly closed
                for _ in i + 1..self.stack.len() {
                    self.errors.push(ParseError::new(ErrorCode::MissingEndTag, start));
                }
                self.stack.truncate(i);
            }
            None => {
                if !is_void_tag(&tag.to_ascii_lowercase()) {
                    self.errors.push(ParseError::new(ErrorCode::InvalidEndTag, start));
                }
            }
        }
    }

    fn on_attrib_name(&mut self, start: usize, end: usize) {
        let name = CompactString::from(self.get_source(start, end));
        self.current_attr = Some((name, String::new()));
    }

    fn on_attrib_data(&mut self, start: usize, end: usize) {
        let value = htmlize::unescape_attribute(self.get_source(start, end));
        if let Some((_, current)) = self.current_attr.as_mut() {
            current.push_str(&value);
        }
    }

    fn on_attrib_end(&mut self, _quote: QuoteType, _end: usize) {
        let (Some((name, value)), Some(element)) =
            (self.current_attr.take(), self.current_element)
        else {
            return;
        };
        if let Some(el) = self.doc.element_mut(element) {
            // First occurrence wins, as in browsers
            if !el.attributes.iter().any(|a| a.name == name) {
                el.attributes.push(Attribute::new(name, value));
            }
        }
    }

    fn on_comment(&mut self, start: usize, end: usize) {
        let node = self.doc.create_comment(self.get_source(start, end));
        self.add_child(node);
    }

    fn on_end(&mut self) {}

    fn on_error(&mut self, code: ErrorCode, index: usize) {
        self.errors.push(ParseError::new(code, index));
    }
}

/// Parse a page into a fresh document
pub fn parse(source: &str) -> (Document, Vec<ParseError>) {
    let mut doc = Document::new();
    let root = doc.root();
    let errors = parse_fragment_into(&mut doc, root, source);
    (doc, errors)
}

/// Parse `source` and append the resulting nodes under `parent`
pub fn parse_fragment_into(doc: &mut Document, parent: NodeId, source: &str) -> Vec<ParseError> {
    let mut tokenizer = Tokenizer::new(source, Parser::new(source, doc, parent));
    tokenizer.tokenize();
    let mut parser = tokenizer.into_callbacks();
    parser.handle_unclosed_elements();
    parser.errors
}
