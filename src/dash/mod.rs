//! Parsing of MPEG-DASH MPD manifests.
//!
//! The parser flattens the Period / AdaptationSet / Representation hierarchy: every
//! Representation is returned with its effective attributes (inherited from the enclosing
//! elements) and its segments already expanded from whichever of SegmentTemplate, SegmentList
//! or SegmentBase applies to it.

mod scanner;
mod tags;
mod manifest;
mod template;
mod addressing;
mod state;
mod pending;
mod parser;

pub use scanner::{MpdScanner, MpdToken};
pub use manifest::*;
pub use parser::DashParser;

use crate::options::ParserOptions;
use crate::ProgressiveParser;


/// Parse a complete MPD manifest.
pub fn parse(text: &str, options: &ParserOptions) -> ParsedManifest {
    DashParser::new(options.clone()).parse(text)
}
