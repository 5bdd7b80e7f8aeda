//! Types shared by the DASH and HLS tokenizers, and incremental decoding of byte input.

use indexmap::IndexMap;
use serde::Serialize;
use crate::ManifestError;


/// Raw attribute values of a tag, in document order.
pub type Attributes = IndexMap<String, String>;

/// The tokenizer's unit of output: one complete tag. For HLS, `value` is the text after the colon
/// of a tag that doesn't use an attribute list (such as `#EXTINF:9.009,`); for DASH it is the
/// text content of an element with no child elements (such as `<BaseURL>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagEvent {
    pub key: String,
    pub value: Option<String>,
    pub attributes: Attributes,
}

impl TagEvent {
    pub fn new(key: &str) -> TagEvent {
        TagEvent { key: key.to_string(), ..Default::default() }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}


// Decodes a byte stream to characters. A multibyte UTF-8 sequence that is split across two
// chunks is carried over to the next call. Bytes that are not valid UTF-8 are decoded as
// ISO-8859-1, which is what older servers serving playlists as "byte strings" produce.
#[derive(Debug, Default, Clone)]
pub(crate) struct ByteDecoder {
    carry: Vec<u8>,
}

impl ByteDecoder {
    pub(crate) fn decode(&mut self, chunk: &[u8]) -> String {
        let joined: Vec<u8>;
        let mut rest: &[u8] = if self.carry.is_empty() {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.carry);
            buf.extend_from_slice(chunk);
            joined = buf;
            &joined
        };
        let mut out = String::with_capacity(rest.len());
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                },
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(s) = std::str::from_utf8(valid) {
                        out.push_str(s);
                    }
                    match e.error_len() {
                        // incomplete sequence at the end of the chunk
                        None => {
                            self.carry = after.to_vec();
                            break;
                        },
                        Some(n) => {
                            out.extend(after[..n].iter().map(|&b| b as char));
                            rest = &after[n..];
                        },
                    }
                },
            }
        }
        out
    }

    // Bytes still held back at the end of input can never complete a character.
    pub(crate) fn flush(&mut self) -> String {
        std::mem::take(&mut self.carry).into_iter().map(|b| b as char).collect()
    }

    pub(crate) fn reset(&mut self) {
        self.carry.clear();
    }
}


// Input bookkeeping common to both parsers: the byte decoder, the leading byte order mark, and
// whether done() has finished the session.
#[derive(Debug, Default, Clone)]
pub(crate) struct SessionInput {
    decoder: ByteDecoder,
    started: bool,
    finished: bool,
}

impl SessionInput {
    pub(crate) fn check_open(&self) -> Result<(), ManifestError> {
        if self.finished {
            Err(ManifestError::SessionFinished)
        } else {
            Ok(())
        }
    }

    // Returns false for characters that the tokenizer must not see.
    pub(crate) fn accept(&mut self, c: char) -> bool {
        if !self.started {
            self.started = true;
            if c == '\u{feff}' {
                return false;
            }
        }
        true
    }

    pub(crate) fn decode(&mut self, chunk: &[u8]) -> String {
        self.decoder.decode(chunk)
    }

    pub(crate) fn finish(&mut self) -> String {
        self.finished = true;
        self.started = false;
        self.decoder.flush()
    }

    pub(crate) fn reset(&mut self) {
        self.decoder.reset();
        self.started = false;
        self.finished = false;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_utf8() {
        let text = "t\u{e9}l\u{e9}vision \u{1f3ac}";
        let bytes = text.as_bytes();
        for split in 0..bytes.len() {
            let mut decoder = ByteDecoder::default();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            assert_eq!(out, text, "split at {split}");
        }
    }

    #[test]
    fn test_latin1_fallback() {
        let mut decoder = ByteDecoder::default();
        assert_eq!(decoder.decode(b"caf\xe9 ok"), "caf\u{e9} ok");
        // a truncated sequence at end of input is flushed byte-as-char
        assert_eq!(decoder.decode(b"x\xc3"), "x");
        assert_eq!(decoder.flush(), "\u{c3}");
    }

    #[test]
    fn test_session_bom() {
        let mut input = SessionInput::default();
        assert!(!input.accept('\u{feff}'));
        assert!(input.accept('#'));
        assert!(input.accept('\u{feff}'));
        assert!(input.check_open().is_ok());
        input.finish();
        assert_eq!(input.check_open(), Err(ManifestError::SessionFinished));
        input.reset();
        assert!(input.check_open().is_ok());
    }
}
