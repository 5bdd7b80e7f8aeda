// The parsed form of an HLS multivariant (master) or media playlist.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_with::skip_serializing_none;
use crate::options::CustomBag;
use crate::values::{ByteRange, Resolution, TypedAttributes};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaylistType {
    Vod,
    Event,
}

/// Encryption of media segments, from `EXT-X-KEY` or `EXT-X-SESSION-KEY`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Key {
    /// NONE, AES-128, SAMPLE-AES, SAMPLE-AES-CTR
    pub method: String,
    pub uri: Option<String>,
    pub resolved_uri: Option<String>,
    pub iv: Option<String>,
    pub key_format: Option<String>,
    pub key_format_versions: Option<String>,
}

/// The media initialization section, from `EXT-X-MAP`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitMap {
    pub uri: String,
    pub resolved_uri: Option<String>,
    pub byte_range: Option<ByteRange>,
}

/// A partial segment of a low-latency playlist, from `EXT-X-PART`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialSegment {
    pub uri: String,
    pub resolved_uri: Option<String>,
    pub duration: f64,
    pub independent: bool,
    pub gap: bool,
    pub byte_range: Option<ByteRange>,
}

/// One media segment: an `EXTINF` tag (and the tags that apply to it) followed by a URI line.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Segment {
    /// Media sequence number.
    pub number: u64,
    pub duration: f64,
    pub title: Option<String>,
    pub uri: String,
    pub resolved_uri: Option<String>,
    /// Start time in seconds, relative to the start of the playlist.
    pub presentation_time: f64,
    pub discontinuity: bool,
    pub discontinuity_sequence: u64,
    pub byte_range: Option<ByteRange>,
    pub key: Option<Key>,
    pub map: Option<InitMap>,
    pub program_date_time: Option<DateTime<Utc>>,
    pub gap: bool,
    /// Approximate bitrate in kbit/s, from `EXT-X-BITRATE`.
    pub bitrate: Option<u64>,
    pub parts: Vec<PartialSegment>,
}

/// A variant stream of a multivariant playlist: `EXT-X-STREAM-INF` followed by a URI line.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Variant {
    pub uri: String,
    pub resolved_uri: Option<String>,
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub codecs: Option<String>,
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<f64>,
    pub hdcp_level: Option<String>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub subtitles: Option<String>,
    pub closed_captions: Option<String>,
    pub score: Option<f64>,
    pub attributes: TypedAttributes,
}

/// An I-frame playlist, from `EXT-X-I-FRAME-STREAM-INF`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IFrameVariant {
    pub uri: String,
    pub resolved_uri: Option<String>,
    pub bandwidth: u64,
    pub codecs: Option<String>,
    pub resolution: Option<Resolution>,
    pub attributes: TypedAttributes,
}

/// An alternative rendition (audio, video, subtitles or closed captions), from `EXT-X-MEDIA`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rendition {
    pub media_type: String,
    pub group_id: String,
    pub name: String,
    pub uri: Option<String>,
    pub resolved_uri: Option<String>,
    pub language: Option<String>,
    pub assoc_language: Option<String>,
    pub default: bool,
    pub autoselect: bool,
    pub forced: bool,
    pub instream_id: Option<String>,
    pub characteristics: Option<String>,
    pub channels: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateRange {
    pub id: String,
    pub class: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub planned_duration: Option<f64>,
    pub end_on_next: bool,
    /// All attributes, including client-defined `X-` attributes and SCTE-35 markers.
    pub attributes: TypedAttributes,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionData {
    pub data_id: String,
    pub value: Option<String>,
    pub uri: Option<String>,
    pub language: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StartPoint {
    pub time_offset: f64,
    pub precise: bool,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerControl {
    pub can_block_reload: bool,
    pub can_skip_until: Option<f64>,
    pub can_skip_dateranges: bool,
    pub hold_back: Option<f64>,
    pub part_hold_back: Option<f64>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreloadHint {
    /// PART or MAP
    pub hint_type: String,
    pub uri: String,
    pub resolved_uri: Option<String>,
    pub byte_range_start: Option<u64>,
    pub byte_range_length: Option<u64>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenditionReport {
    pub uri: String,
    pub last_msn: Option<u64>,
    pub last_part: Option<u64>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentSteering {
    pub server_uri: String,
    pub pathway_id: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Skip {
    pub skipped_segments: u64,
    pub recently_removed_dateranges: Vec<String>,
}

/// The result of parsing an HLS playlist. Multivariant playlists fill in `variants`,
/// `renditions` and the session-level fields; media playlists fill in `segments` and the
/// timing fields.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedPlaylist {
    /// Whether the `#EXTM3U` header was seen.
    pub m3u: bool,
    pub version: Option<u64>,
    pub independent_segments: bool,
    pub start: Option<StartPoint>,
    pub target_duration: Option<f64>,
    pub media_sequence: u64,
    pub discontinuity_sequence: u64,
    pub playlist_type: Option<PlaylistType>,
    pub i_frames_only: bool,
    pub end_list: bool,
    pub part_target: Option<f64>,
    pub server_control: Option<ServerControl>,
    pub skip: Option<Skip>,
    pub segments: Vec<Segment>,
    /// Partial segments that follow the last complete segment.
    pub partial_segments: Vec<PartialSegment>,
    pub preload_hints: Vec<PreloadHint>,
    pub rendition_reports: Vec<RenditionReport>,
    pub date_ranges: Vec<DateRange>,
    pub variants: Vec<Variant>,
    pub i_frame_variants: Vec<IFrameVariant>,
    pub renditions: Vec<Rendition>,
    pub session_data: Vec<SessionData>,
    pub session_keys: Vec<Key>,
    pub content_steering: Option<ContentSteering>,
    /// Variables from `EXT-X-DEFINE`.
    pub defines: IndexMap<String, String>,
    /// The METHOD of the first `EXT-X-KEY` or `EXT-X-SESSION-KEY` other than NONE.
    pub encryption_scheme: Option<String>,
    pub custom: CustomBag,
}

impl ParsedPlaylist {
    pub fn is_multivariant(&self) -> bool {
        !self.variants.is_empty() || !self.i_frame_variants.is_empty()
    }

    /// Sum of the segment durations, in seconds.
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}
