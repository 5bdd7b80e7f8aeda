// The parsed form of an MPD: timing metadata plus a flat list of representations, each carrying
// its fully expanded segment list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;
use crate::options::CustomBag;
use crate::values::{ByteRange, TypedAttributes};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestType {
    #[default]
    Static,
    Dynamic,
}

/// One media segment. Times and durations are in seconds.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Segment {
    /// `$Number$` of the segment, or its index for `SegmentList` addressing.
    pub number: u64,
    /// `$Time$` of the segment, in timescale units.
    pub time: Option<u64>,
    pub duration: f64,
    /// Start of the segment on the presentation timeline.
    pub presentation_time: f64,
    pub uri: String,
    pub resolved_uri: Option<String>,
    pub byte_range: Option<ByteRange>,
}

/// A ContentProtection descriptor, with the `cenc:pssh` box content if present.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentProtection {
    pub scheme_id_uri: String,
    pub value: Option<String>,
    pub default_kid: Option<String>,
    pub pssh: Option<String>,
    pub attributes: TypedAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DescriptorKind {
    Role,
    Accessibility,
    AudioChannelConfiguration,
    EssentialProperty,
    SupplementalProperty,
    Viewpoint,
}

/// A `schemeIdUri`/`value` descriptor such as `Role` or `EssentialProperty`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub kind: DescriptorKind,
    pub scheme_id_uri: String,
    pub value: Option<String>,
    pub id: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UtcTiming {
    pub scheme_id_uri: String,
    pub value: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgramInformation {
    pub lang: Option<String>,
    pub more_information_url: Option<String>,
    pub title: Option<String>,
    pub source: Option<String>,
    pub copyright: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Event {
    pub id: Option<String>,
    /// In seconds, relative to the start of the period.
    pub presentation_time: f64,
    pub duration: Option<f64>,
    pub message_data: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventStream {
    pub period_id: Option<String>,
    pub scheme_id_uri: String,
    pub value: Option<String>,
    pub timescale: u64,
    pub events: Vec<Event>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodInfo {
    pub id: Option<String>,
    pub start: f64,
    pub duration: Option<f64>,
}

/// One representation, as delivered from one base URL. A representation that is reachable from
/// several base URLs appears once per base URL.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Representation {
    pub id: String,
    pub period_index: usize,
    pub period_id: Option<String>,
    pub adaptation_set_id: Option<String>,
    pub base_url: Option<String>,
    pub bandwidth: u64,
    pub mime_type: Option<String>,
    pub content_type: Option<String>,
    pub codecs: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub frame_rate: Option<f64>,
    pub audio_sampling_rate: Option<String>,
    pub lang: Option<String>,
    pub label: Option<String>,
    /// Effective attributes: MPD, Period, AdaptationSet and Representation attributes merged in
    /// that order, later levels overriding earlier ones.
    pub attributes: TypedAttributes,
    pub content_protections: Vec<ContentProtection>,
    pub descriptors: Vec<Descriptor>,
    pub initialization: Option<Segment>,
    pub index_range: Option<ByteRange>,
    pub segments: Vec<Segment>,
}

impl Representation {
    /// Sum of the segment durations, in seconds.
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// The result of parsing an MPD manifest.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedManifest {
    pub manifest_type: ManifestType,
    pub id: Option<String>,
    pub profiles: Option<String>,
    pub min_buffer_time: Option<f64>,
    pub media_presentation_duration: Option<f64>,
    pub minimum_update_period: Option<f64>,
    pub time_shift_buffer_depth: Option<f64>,
    pub suggested_presentation_delay: Option<f64>,
    pub max_segment_duration: Option<f64>,
    pub availability_start_time: Option<DateTime<Utc>>,
    pub availability_end_time: Option<DateTime<Utc>>,
    pub publish_time: Option<DateTime<Utc>>,
    pub periods: Vec<PeriodInfo>,
    pub representations: Vec<Representation>,
    pub locations: Vec<String>,
    pub utc_timings: Vec<UtcTiming>,
    pub program_information: Vec<ProgramInformation>,
    pub event_streams: Vec<EventStream>,
    /// The `value` of the first `urn:mpeg:dash:mp4protection:2011` ContentProtection element,
    /// such as "cenc" or "cbcs".
    pub encryption_scheme: Option<String>,
    pub custom: CustomBag,
}

impl ParsedManifest {
    pub fn is_dynamic(&self) -> bool {
        self.manifest_type == ManifestType::Dynamic
    }
}
