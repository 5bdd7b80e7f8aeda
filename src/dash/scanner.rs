// Character-level tokenizer for MPD documents.
//
// This is not a general XML parser. It recognizes start tags, end tags and empty-element tags with
// their attributes, collects the text content of elements, and skips the XML declaration,
// processing instructions, comments and <!DOCTYPE>. CDATA sections contribute their content to
// the text of the enclosing element.
//
// A start tag is held back until we know whether it has child elements: it is emitted as
// MpdToken::Open when its first child element starts, and as MpdToken::Leaf (with its text
// content as the value) when its matching end tag arrives. Empty-element tags are emitted as
// MpdToken::Leaf directly. A parser therefore sees BaseURL, Label and friends as a single event
// carrying their text.

use std::collections::VecDeque;
use quick_xml::escape::unescape;
use crate::scanner::{Attributes, TagEvent};


/// An event produced by the MPD tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MpdToken {
    /// An element with child elements. Its matching `Close` follows its children.
    Open(TagEvent),
    /// An element without child elements, with its text content as the value.
    Leaf(TagEvent),
    Close(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Text,
    TagStart,
    StartName,
    InTag,
    AttrName,
    AfterAttrName,
    BeforeAttrValue,
    QuotedValue,
    UnquotedValue,
    EmptyTagEnd,
    EndName,
    Markup,
    Comment,
    Cdata,
    Instruction,
}

/// Resumable tokenizer for MPD manifests.
///
/// Tokens are returned in document order. When a single character completes two tokens (for
/// example the end tag of a childless element that closes an unrelated open element), the second
/// one is returned by the following call to [`feed`](MpdScanner::feed), or by
/// [`finish`](MpdScanner::finish) at end of input.
#[derive(Debug, Clone, Default)]
pub struct MpdScanner {
    state: State,
    name: String,
    attr_name: String,
    attr_value: String,
    attributes: Attributes,
    quote: char,
    text: String,
    held: Option<TagEvent>,
    markup: String,
    markup_depth: usize,
    // consecutive '-' in a comment, ']' in a CDATA section, or '?' in a processing instruction
    run: usize,
    queue: VecDeque<MpdToken>,
}

fn decode_entities(s: &str) -> String {
    match unescape(s) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s.to_string(),
    }
}

impl MpdScanner {
    pub fn new() -> MpdScanner {
        MpdScanner::default()
    }

    pub fn feed(&mut self, c: char) -> Option<MpdToken> {
        self.step(c);
        self.queue.pop_front()
    }

    /// End of input. Returns the tokens still queued (including an element whose start tag was
    /// seen but not its end tag, as `Open`) and whether the input ended inside markup.
    pub fn finish(&mut self) -> (Vec<MpdToken>, bool) {
        let truncated = self.state != State::Text;
        if let Some(held) = self.held.take() {
            self.queue.push_back(MpdToken::Open(held));
        }
        let tokens = self.queue.drain(..).collect();
        *self = MpdScanner::default();
        (tokens, truncated)
    }

    fn step(&mut self, c: char) {
        match self.state {
            State::Text => {
                if c == '<' {
                    self.state = State::TagStart;
                } else if self.held.is_some() {
                    self.text.push(c);
                }
            },
            State::TagStart => match c {
                '/' => self.state = State::EndName,
                '!' => {
                    self.markup.clear();
                    self.markup_depth = 0;
                    self.state = State::Markup;
                },
                '?' => {
                    self.run = 0;
                    self.state = State::Instruction;
                },
                c if c.is_whitespace() => self.state = State::Text,
                _ => {
                    self.name.push(c);
                    self.state = State::StartName;
                },
            },
            State::StartName => match c {
                '>' => self.end_start_tag(false),
                '/' => self.state = State::EmptyTagEnd,
                c if c.is_whitespace() => self.state = State::InTag,
                _ => self.name.push(c),
            },
            State::InTag => match c {
                '>' => self.end_start_tag(false),
                '/' => self.state = State::EmptyTagEnd,
                c if c.is_whitespace() => (),
                _ => {
                    self.attr_name.push(c);
                    self.state = State::AttrName;
                },
            },
            State::AttrName => match c {
                '=' => self.state = State::BeforeAttrValue,
                '>' => {
                    self.commit_attribute();
                    self.end_start_tag(false);
                },
                '/' => {
                    self.commit_attribute();
                    self.state = State::EmptyTagEnd;
                },
                c if c.is_whitespace() => self.state = State::AfterAttrName,
                _ => self.attr_name.push(c),
            },
            State::AfterAttrName => match c {
                '=' => self.state = State::BeforeAttrValue,
                '>' => {
                    self.commit_attribute();
                    self.end_start_tag(false);
                },
                '/' => {
                    self.commit_attribute();
                    self.state = State::EmptyTagEnd;
                },
                c if c.is_whitespace() => (),
                _ => {
                    // attribute without a value
                    self.commit_attribute();
                    self.attr_name.push(c);
                    self.state = State::AttrName;
                },
            },
            State::BeforeAttrValue => match c {
                '"' | '\'' => {
                    self.quote = c;
                    self.state = State::QuotedValue;
                },
                '>' => {
                    self.commit_attribute();
                    self.end_start_tag(false);
                },
                c if c.is_whitespace() => (),
                _ => {
                    self.attr_value.push(c);
                    self.state = State::UnquotedValue;
                },
            },
            State::QuotedValue => {
                if c == self.quote {
                    self.commit_attribute();
                    self.state = State::InTag;
                } else {
                    self.attr_value.push(c);
                }
            },
            State::UnquotedValue => match c {
                '>' => {
                    self.commit_attribute();
                    self.end_start_tag(false);
                },
                c if c.is_whitespace() => {
                    self.commit_attribute();
                    self.state = State::InTag;
                },
                _ => self.attr_value.push(c),
            },
            State::EmptyTagEnd => match c {
                '>' => self.end_start_tag(true),
                c if c.is_whitespace() => (),
                _ => {
                    // a stray '/' inside the tag
                    self.state = State::InTag;
                    self.step(c);
                },
            },
            State::EndName => match c {
                '>' => self.end_close_tag(),
                c if c.is_whitespace() => (),
                _ => self.name.push(c),
            },
            State::Markup => {
                if self.markup.len() < 8 {
                    self.markup.push(c);
                }
                if self.markup == "--" {
                    self.run = 0;
                    self.state = State::Comment;
                } else if self.markup == "[CDATA[" {
                    self.run = 0;
                    self.state = State::Cdata;
                } else if !("--".starts_with(&self.markup) || "[CDATA[".starts_with(&self.markup)) {
                    match c {
                        '[' => self.markup_depth += 1,
                        ']' => self.markup_depth = self.markup_depth.saturating_sub(1),
                        '>' if self.markup_depth == 0 => self.state = State::Text,
                        _ => (),
                    }
                }
            },
            State::Comment => match c {
                '-' => self.run += 1,
                '>' if self.run >= 2 => self.state = State::Text,
                _ => self.run = 0,
            },
            State::Cdata => match c {
                ']' => self.run += 1,
                '>' if self.run >= 2 => {
                    self.push_cdata_brackets(self.run - 2);
                    self.state = State::Text;
                },
                _ => {
                    self.push_cdata_brackets(self.run);
                    self.run = 0;
                    if self.held.is_some() {
                        // escaped so that entity decoding of the text gives it back unchanged
                        match c {
                            '&' => self.text.push_str("&amp;"),
                            _ => self.text.push(c),
                        }
                    }
                },
            },
            State::Instruction => match c {
                '?' => self.run = 1,
                '>' if self.run == 1 => self.state = State::Text,
                _ => self.run = 0,
            },
        }
    }

    fn push_cdata_brackets(&mut self, count: usize) {
        if self.held.is_some() {
            self.text.extend(std::iter::repeat(']').take(count));
        }
    }

    fn commit_attribute(&mut self) {
        let name = std::mem::take(&mut self.attr_name);
        let value = std::mem::take(&mut self.attr_value);
        if !name.is_empty() {
            self.attributes.insert(name, decode_entities(&value));
        }
    }

    fn end_start_tag(&mut self, empty: bool) {
        let event = TagEvent {
            key: std::mem::take(&mut self.name),
            value: None,
            attributes: std::mem::take(&mut self.attributes),
        };
        self.text.clear();
        if let Some(parent) = self.held.take() {
            self.queue.push_back(MpdToken::Open(parent));
        }
        if empty {
            self.queue.push_back(MpdToken::Leaf(event));
        } else {
            self.held = Some(event);
        }
        self.state = State::Text;
    }

    fn end_close_tag(&mut self) {
        let name = std::mem::take(&mut self.name);
        let text = std::mem::take(&mut self.text);
        match self.held.take() {
            Some(mut event) if event.key == name => {
                let text = decode_entities(text.trim());
                event.value = if text.is_empty() { None } else { Some(text) };
                self.queue.push_back(MpdToken::Leaf(event));
            },
            Some(event) => {
                self.queue.push_back(MpdToken::Leaf(event));
                self.queue.push_back(MpdToken::Close(name));
            },
            None => self.queue.push_back(MpdToken::Close(name)),
        }
        self.state = State::Text;
    }
}
