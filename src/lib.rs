//! A Rust library for progressive parsing of adaptive-streaming manifests: MPEG-DASH Media
//! Presentation Descriptions (MPD, an XML format) and HLS playlists (M3U8). The parser produces a
//! validated, structured, in-memory model of the available media (periods, representations,
//! segments, encryption and timing metadata) that a playback client can use to schedule segment
//! requests.
//!
//! [DASH](https://en.wikipedia.org/wiki/Dynamic_Adaptive_Streaming_over_HTTP) and
//! [HLS](https://datatracker.ietf.org/doc/html/rfc8216) manifests are often delivered over a slow
//! network connection, or are very large (a long live stream with a SegmentTimeline containing
//! thousands of entries). This library therefore does not require the whole manifest to be
//! available before starting work: text can be pushed in chunks of any size, as it arrives from
//! the network, and the parser resumes exactly where it stopped, without re-scanning bytes it has
//! already consumed. Parsing the complete text in one call and pushing the same text in chunks
//! produce identical output.
//!
//! ## Architecture
//!
//! - A character-level finite state machine (one per format) turns raw text into tag events.
//! - A per-format tag table routes each event to the code that understands it, after checking
//!   required attributes and coercing attribute values to numbers, durations, dates and so on.
//! - DASH only: a resolution state carries inherited attributes (MPD → Period → AdaptationSet →
//!   Representation), the stack of active BaseURLs and the SegmentTemplate/SegmentList state, and
//!   a pending registry defers elements whose meaning depends on children not yet seen.
//!
//! Problems in the manifest (missing required attributes, values that don't parse, unknown tags)
//! never abort a parse: the offending tag is skipped and a [`ParseWarning`] is reported to the
//! `warn_callback` configured in [`ParserOptions`], and logged using the `tracing` crate.
//!
//! ## Example
//!
//! ```rust
//! use stream_manifest::{hls::HlsParser, ParserOptions, ProgressiveParser};
//!
//! let mut parser = HlsParser::new(ParserOptions::new());
//! parser.push("#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTI").unwrap();
//! parser.push("NF:9.009,\nsegment0.ts\n#EXT-X-ENDLIST\n").unwrap();
//! let playlist = parser.done();
//! assert_eq!(playlist.segments.len(), 1);
//! assert!(playlist.end_list);
//! ```
//!
//! ## Limitations
//!
//! - No network access: fetching the manifest (and retrying failed requests) is the caller's job.
//! - Dynamic (live) DASH manifests are parsed, but no wall-clock based segment availability
//!   computation is performed.
//! - XLink references in DASH manifests are recorded but not resolved.
//
// Reference dash.js library: https://github.com/Dash-Industry-Forum/dash.js
// Google Shaka player: https://github.com/google/shaka-player
// HLS specification: https://datatracker.ietf.org/doc/html/draft-pantos-hls-rfc8216bis


pub mod values;
pub mod options;
pub mod scanner;
pub mod warning;
mod dispatch;
pub mod dash;
pub mod hls;

pub use crate::options::{ParserOptions, CustomBag};
pub use crate::scanner::{TagEvent, Attributes};
pub use crate::values::{AttrValue, TypedAttributes, ByteRange, Resolution};
pub use crate::warning::ParseWarning;
pub use crate::dash::{DashParser, ParsedManifest};
pub use crate::hls::{HlsParser, ParsedPlaylist};


#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("parse error {0}")]
    Parsing(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("push() called after done(); call reset() before reusing this parser")]
    SessionFinished,
}


/// The two parsing disciplines shared by the DASH and HLS parsers.
///
/// A parser is a parse session: it owns the tokenizer state, the shared resolution state and the
/// document being assembled. Text is fed with [`push`](ProgressiveParser::push) (or
/// [`push_bytes`](ProgressiveParser::push_bytes)) any number of times, and
/// [`done`](ProgressiveParser::done) returns the accumulated document, discards any tag that is
/// still waiting for data, and resets the internal state.
///
/// After `done()` the session is finished: further calls to `push` return
/// [`ManifestError::SessionFinished`] until [`reset`](ProgressiveParser::reset) is called. Calling
/// `done()` again is allowed and returns an empty document. Options and callbacks survive both
/// `done()` and `reset()`.
pub trait ProgressiveParser {
    type Document;

    /// Feed a chunk of manifest text. Chunks may be split anywhere, including in the middle of a
    /// tag, an attribute name or a quoted value.
    fn push(&mut self, chunk: &str) -> Result<(), ManifestError>;

    /// Feed a chunk of raw bytes. UTF-8 multibyte sequences may be split across chunks; bytes
    /// that are not valid UTF-8 are decoded as ISO-8859-1.
    fn push_bytes(&mut self, chunk: &[u8]) -> Result<(), ManifestError>;

    /// Finish the parse session and return the assembled document.
    fn done(&mut self) -> Self::Document;

    /// Discard all in-flight state and make the session ready for a new manifest.
    fn reset(&mut self);

    /// Parse a complete manifest in one call. Equivalent to `reset()`, `push(text)`, `done()`.
    fn parse(&mut self, text: &str) -> Self::Document {
        self.reset();
        if let Err(e) = self.push(text) {
            tracing::error!("parsing complete manifest: {e}");
        }
        self.done()
    }
}
