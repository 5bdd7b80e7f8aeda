// The MPD element table, with required attributes and attribute coercions.

use crate::dispatch::Required;
use crate::values::Coercion;
use super::manifest::DescriptorKind;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DashTag {
    Mpd,
    Period,
    AdaptationSet,
    Representation,
    BaseUrl,
    SegmentTemplate,
    SegmentTimeline,
    S,
    SegmentBase,
    SegmentList,
    SegmentUrl,
    Initialization,
    RepresentationIndex,
    ContentProtection,
    Pssh,
    Role,
    Accessibility,
    AudioChannelConfiguration,
    EssentialProperty,
    SupplementalProperty,
    Viewpoint,
    Label,
    Location,
    UtcTiming,
    ProgramInformation,
    Title,
    Source,
    Copyright,
    EventStream,
    Event,
}

pub(crate) const DASH_TAGS: &[(&str, DashTag)] = &[
    ("MPD", DashTag::Mpd),
    ("Period", DashTag::Period),
    ("AdaptationSet", DashTag::AdaptationSet),
    ("Representation", DashTag::Representation),
    ("BaseURL", DashTag::BaseUrl),
    ("SegmentTemplate", DashTag::SegmentTemplate),
    ("SegmentTimeline", DashTag::SegmentTimeline),
    ("S", DashTag::S),
    ("SegmentBase", DashTag::SegmentBase),
    ("SegmentList", DashTag::SegmentList),
    ("SegmentURL", DashTag::SegmentUrl),
    ("Initialization", DashTag::Initialization),
    ("RepresentationIndex", DashTag::RepresentationIndex),
    ("ContentProtection", DashTag::ContentProtection),
    ("cenc:pssh", DashTag::Pssh),
    ("Role", DashTag::Role),
    ("Accessibility", DashTag::Accessibility),
    ("AudioChannelConfiguration", DashTag::AudioChannelConfiguration),
    ("EssentialProperty", DashTag::EssentialProperty),
    ("SupplementalProperty", DashTag::SupplementalProperty),
    ("Viewpoint", DashTag::Viewpoint),
    ("Label", DashTag::Label),
    ("Location", DashTag::Location),
    ("UTCTiming", DashTag::UtcTiming),
    ("ProgramInformation", DashTag::ProgramInformation),
    ("Title", DashTag::Title),
    ("Source", DashTag::Source),
    ("Copyright", DashTag::Copyright),
    ("EventStream", DashTag::EventStream),
    ("Event", DashTag::Event),
];

impl DashTag {
    pub(crate) fn from_key(key: &str) -> Option<DashTag> {
        DASH_TAGS.iter().find(|(k, _)| *k == key).map(|(_, t)| *t)
    }

    pub(crate) fn keys() -> Vec<&'static str> {
        DASH_TAGS.iter().map(|(k, _)| *k).collect()
    }

    pub(crate) fn required(self) -> Required {
        match self {
            DashTag::AdaptationSet => Required::AnyOf(&["mimeType", "contentType"]),
            DashTag::Representation => Required::All(&["id", "bandwidth"]),
            DashTag::S => Required::All(&["d"]),
            DashTag::ContentProtection | DashTag::UtcTiming | DashTag::EventStream => Required::All(&["schemeIdUri"]),
            t if t.descriptor_kind().is_some() => Required::All(&["schemeIdUri"]),
            _ => Required::Nothing,
        }
    }

    pub(crate) fn descriptor_kind(self) -> Option<DescriptorKind> {
        match self {
            DashTag::Role => Some(DescriptorKind::Role),
            DashTag::Accessibility => Some(DescriptorKind::Accessibility),
            DashTag::AudioChannelConfiguration => Some(DescriptorKind::AudioChannelConfiguration),
            DashTag::EssentialProperty => Some(DescriptorKind::EssentialProperty),
            DashTag::SupplementalProperty => Some(DescriptorKind::SupplementalProperty),
            DashTag::Viewpoint => Some(DescriptorKind::Viewpoint),
            _ => None,
        }
    }

    // Elements that carry segment addressing information.
    pub(crate) fn is_addressing(self) -> bool {
        matches!(self, DashTag::SegmentTemplate | DashTag::SegmentList | DashTag::SegmentBase)
    }
}

/// How the value of attribute `name` on element `tag` is coerced. The same attribute name can
/// have different types on different elements (`duration` is an xs:duration on a Period but a
/// count of timescale units on a SegmentTemplate).
pub(crate) fn dash_coercion(tag: DashTag, name: &str) -> Coercion {
    match (tag, name) {
        (DashTag::Period, "duration") => Coercion::Duration,
        (_, "duration") => Coercion::TimescaleDuration,
        (_, "minBufferTime" | "mediaPresentationDuration" | "minimumUpdatePeriod" |
         "timeShiftBufferDepth" | "suggestedPresentationDelay" | "maxSegmentDuration" |
         "maxSubsegmentDuration" | "start") => Coercion::Duration,
        (_, "availabilityStartTime" | "availabilityEndTime" | "publishTime") => Coercion::Date,
        (_, "bandwidth" | "width" | "height" | "timescale" | "startNumber" | "endNumber" |
         "t" | "d" | "r" | "n" | "presentationTimeOffset" | "maxWidth" | "maxHeight" |
         "minWidth" | "minHeight" | "maxBandwidth" | "minBandwidth" | "qualityRanking" |
         "selectionPriority" | "presentationTime") => Coercion::Int,
        (_, "availabilityTimeOffset") => Coercion::Float,
        (_, "segmentAlignment" | "subsegmentAlignment" | "bitstreamSwitching" |
         "availabilityTimeComplete" | "indexRangeExact") => Coercion::Bool,
        (_, "frameRate" | "maxFrameRate" | "minFrameRate") => Coercion::Fraction,
        (_, "mediaRange" | "indexRange" | "range") => Coercion::ByteRange,
        _ => Coercion::Identity,
    }
}
