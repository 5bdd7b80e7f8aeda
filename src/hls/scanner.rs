// Character-level tokenizer for M3U8 playlists.
//
// States and transitions:
//
//   EmptySpace     --'#'-->  TagKey        --other--> Url
//   TagKey         --':'-->  TagValue      --'\n'--> EmptySpace (flag tag such as #EXT-X-ENDLIST)
//   TagValue       --'='-->  AttributeValue (the value read so far was the first attribute name)
//   TagValue       --'\n'--> EmptySpace (scalar tag such as #EXTINF:10,)
//   AttributeValue --'"'-->  QuotedString  --'"'--> AttributeValue
//   AttributeValue --','-->  AttributeKey  --'='--> AttributeValue
//   any state      --'\n'--> EmptySpace, emitting the accumulated event
//
// except QuotedString, which accumulates newlines so that an unterminated quoted value never
// produces an event. Lines starting with '#' that are not tags ("#EXT...") are comments.

use crate::scanner::{Attributes, TagEvent};


/// An event produced by the playlist tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistToken {
    Tag(TagEvent),
    Uri(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    EmptySpace,
    TagKey,
    TagValue,
    AttributeKey,
    AttributeValue,
    QuotedString,
    Url,
    Comment,
}

/// Resumable tokenizer for HLS playlists. Feeding a playlist one character at a time, or in
/// chunks of any size, produces the same sequence of tokens.
#[derive(Debug, Clone, Default)]
pub struct PlaylistScanner {
    state: State,
    key: String,
    value: String,
    // true while every character of `value` could belong to an attribute name
    value_is_name: bool,
    attr_key: String,
    attr_value: String,
    attributes: Attributes,
    url: String,
}

fn attribute_name_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'
}

impl PlaylistScanner {
    pub fn new() -> PlaylistScanner {
        PlaylistScanner::default()
    }

    pub fn feed(&mut self, c: char) -> Option<PlaylistToken> {
        if c == '\r' && self.state != State::QuotedString {
            return None;
        }
        match self.state {
            State::EmptySpace => {
                match c {
                    '#' => {
                        self.state = State::TagKey;
                    },
                    '\n' | ' ' | '\t' => (),
                    _ => {
                        self.url.push(c);
                        self.state = State::Url;
                    },
                }
                None
            },
            State::TagKey => {
                match c {
                    '\n' => self.emit_tag(),
                    ':' => {
                        self.state = if self.key.starts_with("EXT") { State::TagValue } else { State::Comment };
                        self.value_is_name = true;
                        None
                    },
                    _ => {
                        self.key.push(c);
                        None
                    },
                }
            },
            State::Comment => {
                if c == '\n' {
                    self.clear();
                }
                None
            },
            State::TagValue => {
                match c {
                    '\n' => self.emit_tag(),
                    '=' if self.value_is_name && !self.value.is_empty() => {
                        self.attr_key = std::mem::take(&mut self.value);
                        self.state = State::AttributeValue;
                        None
                    },
                    _ => {
                        self.value_is_name &= attribute_name_char(c);
                        self.value.push(c);
                        None
                    },
                }
            },
            State::AttributeValue => {
                match c {
                    '"' => {
                        self.state = State::QuotedString;
                        None
                    },
                    ',' => {
                        self.commit_attribute();
                        self.state = State::AttributeKey;
                        None
                    },
                    '\n' => {
                        self.commit_attribute();
                        self.emit_tag()
                    },
                    _ => {
                        self.attr_value.push(c);
                        None
                    },
                }
            },
            State::QuotedString => {
                if c == '"' {
                    self.state = State::AttributeValue;
                } else {
                    self.attr_value.push(c);
                }
                None
            },
            State::AttributeKey => {
                match c {
                    '=' => {
                        self.state = State::AttributeValue;
                        None
                    },
                    '\n' => {
                        self.commit_attribute();
                        self.emit_tag()
                    },
                    ' ' | '\t' => None,
                    _ => {
                        self.attr_key.push(c);
                        None
                    },
                }
            },
            State::Url => {
                if c == '\n' {
                    let uri = std::mem::take(&mut self.url).trim().to_string();
                    self.clear();
                    Some(PlaylistToken::Uri(uri))
                } else {
                    self.url.push(c);
                    None
                }
            },
        }
    }

    /// End of input. A final line without a terminating newline is emitted as if it had one; an
    /// unterminated quoted string is discarded. Returns the last token, if any, and whether
    /// incomplete input was discarded.
    pub fn finish(&mut self) -> (Option<PlaylistToken>, bool) {
        let out = match self.state {
            State::EmptySpace | State::Comment => (None, false),
            State::QuotedString => (None, true),
            _ => (self.feed('\n'), false),
        };
        self.clear();
        out
    }

    fn commit_attribute(&mut self) {
        let key = std::mem::take(&mut self.attr_key);
        let value = std::mem::take(&mut self.attr_value);
        let key = key.trim();
        if !key.is_empty() {
            self.attributes.insert(key.to_string(), value);
        }
    }

    fn emit_tag(&mut self) -> Option<PlaylistToken> {
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);
        let attributes = std::mem::take(&mut self.attributes);
        self.clear();
        if !key.starts_with("EXT") {
            return None;
        }
        let value = if value.is_empty() { None } else { Some(value) };
        Some(PlaylistToken::Tag(TagEvent { key, value, attributes }))
    }

    fn clear(&mut self) {
        self.state = State::EmptySpace;
        self.key.clear();
        self.value.clear();
        self.value_is_name = false;
        self.attr_key.clear();
        self.attr_value.clear();
        self.attributes.clear();
        self.url.clear();
    }
}
