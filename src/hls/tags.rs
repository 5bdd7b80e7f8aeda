// The HLS tag table: one variant per supported tag, with its required attributes and the
// coercion applied to attribute values.

use crate::dispatch::Required;
use crate::values::Coercion;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HlsTag {
    M3u,
    Version,
    IndependentSegments,
    Start,
    Define,
    TargetDuration,
    MediaSequence,
    DiscontinuitySequence,
    PlaylistType,
    IFramesOnly,
    EndList,
    PartInf,
    ServerControl,
    Inf,
    ByteRange,
    Discontinuity,
    Key,
    Map,
    ProgramDateTime,
    Gap,
    Bitrate,
    Part,
    DateRange,
    Skip,
    PreloadHint,
    RenditionReport,
    Media,
    StreamInf,
    IFrameStreamInf,
    SessionData,
    SessionKey,
    ContentSteering,
}

pub(crate) const HLS_TAGS: &[(&str, HlsTag)] = &[
    ("EXTM3U", HlsTag::M3u),
    ("EXT-X-VERSION", HlsTag::Version),
    ("EXT-X-INDEPENDENT-SEGMENTS", HlsTag::IndependentSegments),
    ("EXT-X-START", HlsTag::Start),
    ("EXT-X-DEFINE", HlsTag::Define),
    ("EXT-X-TARGETDURATION", HlsTag::TargetDuration),
    ("EXT-X-MEDIA-SEQUENCE", HlsTag::MediaSequence),
    ("EXT-X-DISCONTINUITY-SEQUENCE", HlsTag::DiscontinuitySequence),
    ("EXT-X-PLAYLIST-TYPE", HlsTag::PlaylistType),
    ("EXT-X-I-FRAMES-ONLY", HlsTag::IFramesOnly),
    ("EXT-X-ENDLIST", HlsTag::EndList),
    ("EXT-X-PART-INF", HlsTag::PartInf),
    ("EXT-X-SERVER-CONTROL", HlsTag::ServerControl),
    ("EXTINF", HlsTag::Inf),
    ("EXT-X-BYTERANGE", HlsTag::ByteRange),
    ("EXT-X-DISCONTINUITY", HlsTag::Discontinuity),
    ("EXT-X-KEY", HlsTag::Key),
    ("EXT-X-MAP", HlsTag::Map),
    ("EXT-X-PROGRAM-DATE-TIME", HlsTag::ProgramDateTime),
    ("EXT-X-GAP", HlsTag::Gap),
    ("EXT-X-BITRATE", HlsTag::Bitrate),
    ("EXT-X-PART", HlsTag::Part),
    ("EXT-X-DATERANGE", HlsTag::DateRange),
    ("EXT-X-SKIP", HlsTag::Skip),
    ("EXT-X-PRELOAD-HINT", HlsTag::PreloadHint),
    ("EXT-X-RENDITION-REPORT", HlsTag::RenditionReport),
    ("EXT-X-MEDIA", HlsTag::Media),
    ("EXT-X-STREAM-INF", HlsTag::StreamInf),
    ("EXT-X-I-FRAME-STREAM-INF", HlsTag::IFrameStreamInf),
    ("EXT-X-SESSION-DATA", HlsTag::SessionData),
    ("EXT-X-SESSION-KEY", HlsTag::SessionKey),
    ("EXT-X-CONTENT-STEERING", HlsTag::ContentSteering),
];

impl HlsTag {
    pub(crate) fn from_key(key: &str) -> Option<HlsTag> {
        HLS_TAGS.iter().find(|(k, _)| *k == key).map(|(_, t)| *t)
    }

    pub(crate) fn keys() -> Vec<&'static str> {
        HLS_TAGS.iter().map(|(k, _)| *k).collect()
    }

    pub(crate) fn required(self) -> Required {
        match self {
            HlsTag::Start => Required::All(&["TIME-OFFSET"]),
            HlsTag::Define => Required::All(&["NAME", "VALUE"]),
            HlsTag::PartInf => Required::All(&["PART-TARGET"]),
            HlsTag::Key | HlsTag::SessionKey => Required::All(&["METHOD"]),
            HlsTag::Map => Required::All(&["URI"]),
            HlsTag::Part => Required::All(&["URI", "DURATION"]),
            HlsTag::DateRange => Required::All(&["ID", "START-DATE"]),
            HlsTag::Skip => Required::All(&["SKIPPED-SEGMENTS"]),
            HlsTag::PreloadHint => Required::All(&["TYPE", "URI"]),
            HlsTag::RenditionReport => Required::All(&["URI"]),
            HlsTag::Media => Required::All(&["TYPE", "GROUP-ID", "NAME"]),
            HlsTag::StreamInf => Required::All(&["BANDWIDTH"]),
            HlsTag::IFrameStreamInf => Required::All(&["BANDWIDTH", "URI"]),
            HlsTag::SessionData => Required::All(&["DATA-ID"]),
            HlsTag::ContentSteering => Required::All(&["SERVER-URI"]),
            _ => Required::Nothing,
        }
    }

    // Tags written as `#TAG:value` rather than with an attribute list.
    pub(crate) fn requires_value(self) -> bool {
        matches!(self,
                 HlsTag::Version | HlsTag::TargetDuration | HlsTag::MediaSequence |
                 HlsTag::DiscontinuitySequence | HlsTag::PlaylistType | HlsTag::Inf |
                 HlsTag::ByteRange | HlsTag::ProgramDateTime | HlsTag::Bitrate)
    }
}

// Attribute names are unique across HLS tags, so the coercion only depends on the name.
pub(crate) fn attribute_coercion(name: &str) -> Coercion {
    match name {
        "BANDWIDTH" | "AVERAGE-BANDWIDTH" | "SKIPPED-SEGMENTS" | "LAST-MSN" | "LAST-PART" |
        "BYTERANGE-START" | "BYTERANGE-LENGTH" => Coercion::Int,
        "FRAME-RATE" | "TIME-OFFSET" | "DURATION" | "PLANNED-DURATION" | "PART-TARGET" |
        "CAN-SKIP-UNTIL" | "HOLD-BACK" | "PART-HOLD-BACK" | "SCORE" => Coercion::Float,
        "DEFAULT" | "AUTOSELECT" | "FORCED" | "PRECISE" | "INDEPENDENT" | "GAP" |
        "CAN-BLOCK-RELOAD" | "CAN-SKIP-DATERANGES" | "END-ON-NEXT" => Coercion::Bool,
        "RESOLUTION" => Coercion::Resolution,
        "START-DATE" | "END-DATE" => Coercion::Date,
        _ => Coercion::Identity,
    }
}
