//! Parsing of HLS playlists (RFC 8216 and its low-latency extensions).

mod scanner;
mod tags;
mod playlist;
mod parser;

pub use scanner::{PlaylistScanner, PlaylistToken};
pub use playlist::*;
pub use parser::HlsParser;

use crate::options::ParserOptions;
use crate::ProgressiveParser;


/// Parse a complete HLS playlist.
pub fn parse(text: &str, options: &ParserOptions) -> ParsedPlaylist {
    HlsParser::new(options.clone()).parse(text)
}
