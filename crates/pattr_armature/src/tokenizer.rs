//! HTML tokenizer for pattr pages.
//!
//! A byte-level state machine in the style of htmlparser2. Sections are
//! reported to a [`Callbacks`] implementation as byte ranges into the
//! source. Attribute names are reported verbatim (`p-html:trim.300`,
//! `@click`); splitting them into directive ids and modifiers is the
//! engine's job, not the tokenizer's.

use pattr_carton::is_raw_text_tag;
use pattr_relief::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    /// Just read `<`
    TagOpen,
    TagName,
    /// Read `/` inside a start tag
    SelfClosing,
    /// Just read `</`
    EndTagOpen,
    EndTagName,
    AfterEndTagName,
    BeforeAttrName,
    AttrName,
    AfterAttrName,
    BeforeAttrValue,
    AttrValue(QuoteType),
    /// `<!DOCTYPE ...>` and `<?...>`, dropped
    Declaration,
    Comment,
    /// script/style/textarea/title content
    RawText,
}

/// How an attribute value was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuoteType {
    NoValue = 0,
    Unquoted = 1,
    Single = 2,
    Double = 3,
}

/// Receives the sections found by the [`Tokenizer`]
pub trait Callbacks {
    fn on_text(&mut self, start: usize, end: usize);
    fn on_raw_text(&mut self, start: usize, end: usize);

    fn on_open_tag_name(&mut self, start: usize, end: usize);
    fn on_open_tag_end(&mut self, end: usize);
    fn on_self_closing_tag(&mut self, end: usize);
    fn on_close_tag(&mut self, start: usize, end: usize);

    fn on_attrib_name(&mut self, start: usize, end: usize);
    fn on_attrib_data(&mut self, start: usize, end: usize);
    fn on_attrib_end(&mut self, quote: QuoteType, end: usize);

    fn on_comment(&mut self, start: usize, end: usize);

    fn on_end(&mut self);
    fn on_error(&mut self, code: ErrorCode, index: usize);
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\t' | b'\x0C' | b'\r')
}

#[inline]
fn ends_tag_section(c: u8) -> bool {
    c == b'/' || c == b'>' || is_whitespace(c)
}

pub struct Tokenizer<'a, C: Callbacks> {
    input: &'a [u8],
    state: State,
    /// Start of the section being read
    start: usize,
    index: usize,
    /// Lowercased name of the raw text element being read
    raw_tag: Option<Vec<u8>>,
    callbacks: C,
}

impl<'a, C: Callbacks> Tokenizer<'a, C> {
    pub fn new(input: &'a str, callbacks: C) -> Self {
        Self {
            input: input.as_bytes(),
            state: State::Text,
            start: 0,
            index: 0,
            raw_tag: None,
            callbacks,
        }
    }

    /// Give back the callbacks once tokenizing is done
    pub fn into_callbacks(self) -> C {
        self.callbacks
    }

    pub fn tokenize(&mut self) {
        while let Some(&c) = self.input.get(self.index) {
            // A state may hand the byte on to the state it switched to
            if !self.step(c) {
                self.index += 1;
            }
        }
        self.finish();
        self.callbacks.on_end();
    }

    /// Consume one byte. Returns true when the byte must be read again in
    /// the new state.
    fn step(&mut self, c: u8) -> bool {
        let index = self.index;
        match self.state {
            State::Text => {
                if c == b'<' {
                    if index > self.start {
                        self.callbacks.on_text(self.start, index);
                    }
                    self.state = State::TagOpen;
                    self.start = index;
                }
            }
            State::TagOpen => match c {
                b'!' if self.input[index + 1..].starts_with(b"--") => {
                    self.state = State::Comment;
                    self.start = index + 3;
                    self.index += 2;
                }
                b'!' | b'?' => self.state = State::Declaration,
                b'/' => self.state = State::EndTagOpen,
                c if c.is_ascii_alphabetic() => {
                    self.state = State::TagName;
                    self.start = index;
                }
                _ => {
                    // Not a tag after all; `<` stays in the text section
                    self.callbacks
                        .on_error(ErrorCode::InvalidFirstCharacterOfTagName, index);
                    self.state = State::Text;
                    return c == b'<';
                }
            },
            State::TagName => {
                if ends_tag_section(c) {
                    let lowered = self.input[self.start..index].to_ascii_lowercase();
                    self.raw_tag = std::str::from_utf8(&lowered)
                        .is_ok_and(is_raw_text_tag)
                        .then_some(lowered);
                    self.callbacks.on_open_tag_name(self.start, index);
                    self.state = State::BeforeAttrName;
                    return true;
                }
            }
            State::SelfClosing => {
                if c == b'>' {
                    self.callbacks.on_self_closing_tag(index);
                    self.raw_tag = None;
                    self.to_text(index + 1);
                } else if !is_whitespace(c) {
                    self.state = State::BeforeAttrName;
                    return true;
                }
            }
            State::EndTagOpen => {
                if c == b'>' {
                    self.callbacks.on_error(ErrorCode::MissingEndTagName, index);
                    self.to_text(index + 1);
                } else if !is_whitespace(c) {
                    self.state = State::EndTagName;
                    self.start = index;
                }
            }
            State::EndTagName => {
                if c == b'>' || is_whitespace(c) {
                    self.callbacks.on_close_tag(self.start, index);
                    if c == b'>' {
                        self.to_text(index + 1);
                    } else {
                        self.state = State::AfterEndTagName;
                    }
                }
            }
            State::AfterEndTagName => {
                if c == b'>' {
                    self.to_text(index + 1);
                }
            }
            State::BeforeAttrName => match c {
                b'>' => {
                    self.callbacks.on_open_tag_end(index);
                    self.start = index + 1;
                    self.state = if self.raw_tag.is_some() {
                        State::RawText
                    } else {
                        State::Text
                    };
                }
                b'/' => self.state = State::SelfClosing,
                c if is_whitespace(c) => {}
                c => {
                    if c == b'=' {
                        self.callbacks
                            .on_error(ErrorCode::UnexpectedEqualsSignBeforeAttributeName, index);
                    }
                    self.state = State::AttrName;
                    self.start = index;
                }
            },
            State::AttrName => {
                if c == b'=' || ends_tag_section(c) {
                    self.callbacks.on_attrib_name(self.start, index);
                    self.state = State::AfterAttrName;
                    return true;
                }
                if matches!(c, b'"' | b'\'' | b'<') {
                    self.callbacks
                        .on_error(ErrorCode::UnexpectedCharacterInAttributeName, index);
                }
            }
            State::AfterAttrName => match c {
                b'=' => self.state = State::BeforeAttrValue,
                b'/' | b'>' => {
                    self.callbacks.on_attrib_end(QuoteType::NoValue, index);
                    self.state = State::BeforeAttrName;
                    return true;
                }
                c if is_whitespace(c) => {}
                _ => {
                    self.callbacks.on_attrib_end(QuoteType::NoValue, index);
                    self.state = State::AttrName;
                    self.start = index;
                }
            },
            State::BeforeAttrValue => match c {
                b'"' | b'\'' => {
                    let quote = if c == b'"' {
                        QuoteType::Double
                    } else {
                        QuoteType::Single
                    };
                    self.state = State::AttrValue(quote);
                    self.start = index + 1;
                }
                b'>' => {
                    self.callbacks.on_error(ErrorCode::MissingAttributeValue, index);
                    self.callbacks.on_attrib_end(QuoteType::NoValue, index);
                    self.state = State::BeforeAttrName;
                    return true;
                }
                c if is_whitespace(c) => {}
                _ => {
                    self.state = State::AttrValue(QuoteType::Unquoted);
                    self.start = index;
                }
            },
            State::AttrValue(quote) => {
                let closes = match quote {
                    QuoteType::Double => c == b'"',
                    QuoteType::Single => c == b'\'',
                    _ => c == b'>' || is_whitespace(c),
                };
                if closes {
                    if index > self.start {
                        self.callbacks.on_attrib_data(self.start, index);
                    }
                    self.callbacks.on_attrib_end(quote, index);
                    self.state = State::BeforeAttrName;
                    self.start = index + 1;
                    // The byte ending an unquoted value belongs to the tag
                    return quote == QuoteType::Unquoted;
                }
            }
            State::Declaration => {
                if c == b'>' {
                    self.to_text(index + 1);
                }
            }
            State::Comment => {
                if c == b'>' && index >= self.start + 2 && self.input[..index].ends_with(b"--") {
                    self.callbacks.on_comment(self.start, index - 2);
                    self.to_text(index + 1);
                }
            }
            State::RawText => {
                if c == b'<' && self.closes_raw_text(index) {
                    if index > self.start {
                        self.callbacks.on_raw_text(self.start, index);
                    }
                    self.raw_tag = None;
                    self.state = State::TagOpen;
                    self.start = index;
                }
            }
        }
        false
    }

    fn to_text(&mut self, start: usize) {
        self.state = State::Text;
        self.start = start;
    }

    /// Whether `</tag` of the open raw text element starts at `index`
    fn closes_raw_text(&self, index: usize) -> bool {
        let Some(tag) = self.raw_tag.as_deref() else {
            return true;
        };
        let rest = &self.input[index + 1..];
        rest.first() == Some(&b'/')
            && rest.len() > tag.len()
            && rest[1..=tag.len()].eq_ignore_ascii_case(tag)
            && rest.get(tag.len() + 1).map_or(true, |c| ends_tag_section(*c))
    }

    /// Report whatever the input ended in the middle of
    fn finish(&mut self) {
        let (start, end) = (self.start, self.index);
        match self.state {
            State::Text if start < end => self.callbacks.on_text(start, end),
            State::Text | State::Declaration => {}
            // A lone trailing `<` is text
            State::TagOpen => self.callbacks.on_text(start, end),
            State::RawText => {
                self.callbacks.on_error(ErrorCode::EofInRawText, end);
                if start < end {
                    self.callbacks.on_raw_text(start, end);
                }
            }
            State::Comment => {
                self.callbacks.on_error(ErrorCode::EofInComment, end);
                if start < end {
                    self.callbacks.on_comment(start, end);
                }
            }
            _ => self.callbacks.on_error(ErrorCode::EofInTag, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder<'s> {
        source: &'s str,
        events: Vec<String>,
    }

    impl Callbacks for Recorder<'_> {
        fn on_text(&mut self, start: usize, end: usize) {
            self.events.push(format!("text:{}", &self.source[start..end]));
        }
        fn on_raw_text(&mut self, start: usize, end: usize) {
            self.events.push(format!("raw:{}", &self.source[start..end]));
        }
        fn on_open_tag_name(&mut self, start: usize, end: usize) {
            self.events.push(format!("open:{}", &self.source[start..end]));
        }
        fn on_open_tag_end(&mut self, _end: usize) {
            self.events.push("open-end".into());
        }
        fn on_self_closing_tag(&mut self, _end: usize) {
            self.events.push("self-close".into());
        }
        fn on_close_tag(&mut self, start: usize, end: usize) {
            self.events.push(format!("close:{}", &self.source[start..end]));
        }
        fn on_attrib_name(&mut self, start: usize, end: usize) {
            self.events.push(format!("attr:{}", &self.source[start..end]));
        }
        fn on_attrib_data(&mut self, start: usize, end: usize) {
            self.events.push(format!("value:{}", &self.source[start..end]));
        }
        fn on_attrib_end(&mut self, _quote: QuoteType, _end: usize) {}
        fn on_comment(&mut self, start: usize, end: usize) {
            self.events.push(format!("comment:{}", &self.source[start..end]));
        }
        fn on_end(&mut self) {}
        fn on_error(&mut self, code: ErrorCode, _index: usize) {
            self.events.push(format!("error:{:?}", code));
        }
    }

    fn tokenize(source: &str) -> Vec<String> {
        let mut tokenizer = Tokenizer::new(
            source,
            Recorder {
                source,
                events: Vec::new(),
            },
        );
        tokenizer.tokenize();
        tokenizer.into_callbacks().events
    }

    #[test]
    fn test_directive_attribute_names_are_verbatim() {
        let events = tokenize(r#"<p p-html:trim.300:allow.p.h1="body" @click="n++">x</p>"#);
        assert_eq!(
            events,
            vec![
                "open:p",
                "attr:p-html:trim.300:allow.p.h1",
                "value:body",
                "attr:@click",
                "value:n++",
                "open-end",
                "text:x",
                "close:p",
            ]
        );
    }

    #[test]
    fn test_raw_text_keeps_markup() {
        let events = tokenize(r#"<script type="application/json">{"a": "<b>"}</script>"#);
        assert!(events.contains(&r#"raw:{"a": "<b>"}"#.to_string()));
        assert_eq!(events.last().map(String::as_str), Some("close:script"));
    }

    #[test]
    fn test_comment_and_doctype() {
        let events = tokenize("<!DOCTYPE html><!-- note --><br/>");
        assert_eq!(events, vec!["comment: note ", "open:br", "self-close"]);
    }

    #[test]
    fn test_boolean_and_unquoted_attributes() {
        let events = tokenize("<input disabled value=3>");
        assert_eq!(
            events,
            vec!["open:input", "attr:disabled", "attr:value", "value:3", "open-end"]
        );
    }
}
