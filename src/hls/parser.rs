// The HLS parse session: routes playlist tokens to the tag table and assembles the playlist.
//
// Media segments are assembled across several tags: EXTINF opens a segment draft, which the next
// URI line completes. Tags seen in between (EXT-X-BYTERANGE, EXT-X-DISCONTINUITY,
// EXT-X-PROGRAM-DATE-TIME, EXT-X-GAP, EXT-X-PART) apply to the draft; EXT-X-KEY, EXT-X-MAP and
// EXT-X-BITRATE apply to every following segment. EXT-X-STREAM-INF similarly waits for the URI
// of its variant stream.

use tracing::trace;
use url::Url;
use crate::{ManifestError, ProgressiveParser};
use crate::dispatch::{route, validate, Route};
use crate::options::ParserOptions;
use crate::scanner::{SessionInput, TagEvent};
use crate::values::{parse_date, parse_float, parse_int, ByteRange, TypedAttributes};
use crate::warning::ParseWarning;
use super::playlist::*;
use super::scanner::{PlaylistScanner, PlaylistToken};
use super::tags::{attribute_coercion, HlsTag};


// Parse an HLS byte range "<length>[@<offset>]". Without an offset the range starts just after the
// end of the previous range of the same resource.
pub(crate) fn parse_hls_byte_range(s: &str, previous_end: Option<u64>) -> Result<ByteRange, ManifestError> {
    let (len, offset) = match s.trim().split_once('@') {
        Some((l, o)) => (l, Some(o)),
        None => (s.trim(), None),
    };
    let length = u64::try_from(parse_int(len)?)
        .ok()
        .filter(|l| *l > 0)
        .ok_or_else(|| ManifestError::InvalidNumber(format!("invalid byte range length in {s:?}")))?;
    let overflow = || ManifestError::InvalidNumber(format!("byte range {s:?} is beyond the largest offset"));
    let from = match offset {
        Some(o) => u64::try_from(parse_int(o)?)
            .map_err(|_| ManifestError::InvalidNumber(format!("negative byte range offset in {s:?}")))?,
        None => match previous_end {
            Some(end) => end.checked_add(1).ok_or_else(overflow)?,
            None => 0,
        },
    };
    let to = from.checked_add(length - 1).ok_or_else(overflow)?;
    Ok(ByteRange { from, to })
}

fn string_attr(attrs: &TypedAttributes, name: &str) -> Option<String> {
    attrs.get(name).map(|v| v.to_string())
}

fn bool_attr(attrs: &TypedAttributes, name: &str) -> bool {
    attrs.get(name).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn u64_attr(attrs: &TypedAttributes, name: &str) -> Option<u64> {
    attrs.get(name).and_then(|v| v.as_u64())
}

fn f64_attr(attrs: &TypedAttributes, name: &str) -> Option<f64> {
    attrs.get(name).and_then(|v| v.as_f64())
}


#[derive(Debug, Default)]
struct SegmentDraft {
    // The EXTINF tag, while the segment is waiting for its URI.
    inf: Option<TagEvent>,
    duration: f64,
    title: Option<String>,
    byte_range: Option<ByteRange>,
    discontinuity: bool,
    program_date_time: Option<chrono::DateTime<chrono::Utc>>,
    gap: bool,
    parts: Vec<PartialSegment>,
}

#[derive(Debug, Default)]
struct HlsState {
    draft: SegmentDraft,
    pending_variant: Option<(TagEvent, Variant)>,
    key: Option<Key>,
    map: Option<InitMap>,
    bitrate: Option<u64>,
    last_range_end: Option<u64>,
    last_part_range_end: Option<u64>,
    presentation_time: f64,
    discontinuities: u64,
    skipped_segments: u64,
}


/// A progressive HLS playlist parser.
///
/// Example
/// ```rust
/// use stream_manifest::{hls::HlsParser, ParserOptions, ProgressiveParser};
///
/// let mut parser = HlsParser::new(ParserOptions::new().with_uri("https://example.com/hls/main.m3u8"));
/// let playlist = parser.parse("#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\nlow/index.m3u8\n");
/// assert_eq!(playlist.variants[0].resolved_uri.as_deref(),
///            Some("https://example.com/hls/low/index.m3u8"));
/// ```
pub struct HlsParser {
    options: ParserOptions,
    base: Option<Url>,
    known_keys: Vec<&'static str>,
    input: SessionInput,
    scanner: PlaylistScanner,
    state: HlsState,
    playlist: ParsedPlaylist,
}

impl HlsParser {
    pub fn new(options: ParserOptions) -> HlsParser {
        let base = options.uri().and_then(|u| match Url::parse(u) {
            Ok(url) => Some(url),
            Err(e) => {
                options.warn(ParseWarning::MalformedInput {
                    reason: format!("ignoring playlist URI {u:?}: {e}"),
                });
                None
            },
        });
        HlsParser {
            options,
            base,
            known_keys: HlsTag::keys(),
            input: SessionInput::default(),
            scanner: PlaylistScanner::new(),
            state: HlsState::default(),
            playlist: ParsedPlaylist::default(),
        }
    }

    fn feed(&mut self, c: char) {
        if let Some(token) = self.scanner.feed(c) {
            self.handle_token(token);
        }
    }

    fn handle_token(&mut self, token: PlaylistToken) {
        match token {
            PlaylistToken::Tag(event) => self.handle_tag(event),
            PlaylistToken::Uri(uri) => self.handle_uri(uri),
        }
    }

    fn resolve(&self, uri: &str) -> Option<String> {
        self.base.as_ref()
            .and_then(|base| base.join(uri).ok())
            .map(|u| u.to_string())
    }

    // Replace {$NAME} references to EXT-X-DEFINE variables.
    fn substitute(&self, s: &str) -> String {
        if self.playlist.defines.is_empty() || !s.contains("{$") {
            return s.to_string();
        }
        let mut out = s.to_string();
        for (name, value) in &self.playlist.defines {
            out = out.replace(&format!("{{${name}}}"), value);
        }
        out
    }

    fn handle_tag(&mut self, event: TagEvent) {
        trace!("HLS tag {}", event.key);
        let known = HlsTag::from_key(&event.key);
        match route(&event.key, known, &self.known_keys, &self.options) {
            Route::Ignored | Route::Unsupported => (),
            Route::Custom(handler) => {
                let event = self.options.transform(event);
                let parent = self.state.draft.inf.as_ref()
                    .or(self.state.pending_variant.as_ref().map(|(t, _)| t));
                handler(&event, parent, &mut self.playlist.custom);
            },
            Route::Known(tag) => {
                let mut event = self.options.transform(event);
                for value in event.attributes.values_mut() {
                    *value = self.substitute(value);
                }
                self.process(tag, event);
            },
        }
    }

    fn invalid_value(&self, event: &TagEvent, reason: impl ToString) {
        self.options.warn(ParseWarning::InvalidTagValue {
            tag: event.key.clone(),
            value: event.value.clone(),
            reason: reason.to_string(),
        });
    }

    fn process(&mut self, tag: HlsTag, event: TagEvent) {
        let value = match (&event.value, tag.requires_value()) {
            (Some(v), _) => v.trim().to_string(),
            (None, true) => {
                self.invalid_value(&event, "missing value");
                return;
            },
            (None, false) => String::new(),
        };
        let Some(attrs) = validate(&event, tag.required(), attribute_coercion, &self.options) else {
            return;
        };
        match tag {
            HlsTag::M3u => self.playlist.m3u = true,
            HlsTag::Version => match parse_int(&value).ok().and_then(|v| u64::try_from(v).ok()) {
                Some(v) => self.playlist.version = Some(v),
                None => self.invalid_value(&event, "expecting a positive integer"),
            },
            HlsTag::IndependentSegments => self.playlist.independent_segments = true,
            HlsTag::Start => {
                self.playlist.start = Some(StartPoint {
                    time_offset: f64_attr(&attrs, "TIME-OFFSET").unwrap_or(0.0),
                    precise: bool_attr(&attrs, "PRECISE"),
                });
            },
            HlsTag::Define => {
                if let (Some(name), Some(value)) = (string_attr(&attrs, "NAME"), string_attr(&attrs, "VALUE")) {
                    self.playlist.defines.insert(name, value);
                }
            },
            HlsTag::TargetDuration => match parse_float(&value) {
                Ok(d) => self.playlist.target_duration = Some(d),
                Err(e) => self.invalid_value(&event, e),
            },
            HlsTag::MediaSequence => match parse_int(&value).ok().and_then(|v| u64::try_from(v).ok()) {
                Some(v) => self.playlist.media_sequence = v,
                None => self.invalid_value(&event, "expecting a positive integer"),
            },
            HlsTag::DiscontinuitySequence => match parse_int(&value).ok().and_then(|v| u64::try_from(v).ok()) {
                Some(v) => self.playlist.discontinuity_sequence = v,
                None => self.invalid_value(&event, "expecting a positive integer"),
            },
            HlsTag::PlaylistType => match value.as_str() {
                "VOD" => self.playlist.playlist_type = Some(PlaylistType::Vod),
                "EVENT" => self.playlist.playlist_type = Some(PlaylistType::Event),
                _ => self.invalid_value(&event, "expecting VOD or EVENT"),
            },
            HlsTag::IFramesOnly => self.playlist.i_frames_only = true,
            HlsTag::EndList => self.playlist.end_list = true,
            HlsTag::PartInf => self.playlist.part_target = f64_attr(&attrs, "PART-TARGET"),
            HlsTag::ServerControl => {
                self.playlist.server_control = Some(ServerControl {
                    can_block_reload: bool_attr(&attrs, "CAN-BLOCK-RELOAD"),
                    can_skip_until: f64_attr(&attrs, "CAN-SKIP-UNTIL"),
                    can_skip_dateranges: bool_attr(&attrs, "CAN-SKIP-DATERANGES"),
                    hold_back: f64_attr(&attrs, "HOLD-BACK"),
                    part_hold_back: f64_attr(&attrs, "PART-HOLD-BACK"),
                });
            },
            HlsTag::Inf => self.process_inf(event, &value),
            HlsTag::ByteRange => match parse_hls_byte_range(&value, self.state.last_range_end) {
                Ok(range) => {
                    self.state.last_range_end = Some(range.to);
                    self.state.draft.byte_range = Some(range);
                },
                Err(e) => self.invalid_value(&event, e),
            },
            HlsTag::Discontinuity => self.state.draft.discontinuity = true,
            HlsTag::Key => {
                let key = self.make_key(&attrs);
                if key.method == "NONE" {
                    self.state.key = None;
                } else {
                    self.note_encryption(&key.method);
                    self.state.key = Some(key);
                }
            },
            HlsTag::Map => {
                let byte_range = match attrs.get("BYTERANGE") {
                    Some(r) => match parse_hls_byte_range(&r.to_string(), None) {
                        Ok(range) => Some(range),
                        Err(e) => {
                            self.invalid_value(&event, e);
                            return;
                        },
                    },
                    None => None,
                };
                let uri = string_attr(&attrs, "URI").unwrap_or_default();
                self.state.map = Some(InitMap {
                    resolved_uri: self.resolve(&uri),
                    uri,
                    byte_range,
                });
            },
            HlsTag::ProgramDateTime => match parse_date(&value) {
                Ok(d) => self.state.draft.program_date_time = Some(d),
                Err(e) => self.invalid_value(&event, e),
            },
            HlsTag::Gap => self.state.draft.gap = true,
            HlsTag::Bitrate => match parse_int(&value).ok().and_then(|v| u64::try_from(v).ok()) {
                Some(v) => self.state.bitrate = Some(v),
                None => self.invalid_value(&event, "expecting a positive integer"),
            },
            HlsTag::Part => {
                let byte_range = match attrs.get("BYTERANGE") {
                    Some(r) => match parse_hls_byte_range(&r.to_string(), self.state.last_part_range_end) {
                        Ok(range) => Some(range),
                        Err(e) => {
                            self.invalid_value(&event, e);
                            return;
                        },
                    },
                    None => None,
                };
                if let Some(range) = byte_range {
                    self.state.last_part_range_end = Some(range.to);
                }
                let uri = string_attr(&attrs, "URI").unwrap_or_default();
                self.state.draft.parts.push(PartialSegment {
                    resolved_uri: self.resolve(&uri),
                    uri,
                    duration: f64_attr(&attrs, "DURATION").unwrap_or(0.0),
                    independent: bool_attr(&attrs, "INDEPENDENT"),
                    gap: bool_attr(&attrs, "GAP"),
                    byte_range,
                });
            },
            HlsTag::DateRange => {
                let Some(start_date) = attrs.get("START-DATE").and_then(|v| v.as_date()) else {
                    return;
                };
                self.playlist.date_ranges.push(DateRange {
                    id: string_attr(&attrs, "ID").unwrap_or_default(),
                    class: string_attr(&attrs, "CLASS"),
                    start_date,
                    end_date: attrs.get("END-DATE").and_then(|v| v.as_date()),
                    duration: f64_attr(&attrs, "DURATION"),
                    planned_duration: f64_attr(&attrs, "PLANNED-DURATION"),
                    end_on_next: bool_attr(&attrs, "END-ON-NEXT"),
                    attributes: attrs,
                });
            },
            HlsTag::Skip => {
                let skipped = u64_attr(&attrs, "SKIPPED-SEGMENTS").unwrap_or(0);
                self.state.skipped_segments = self.state.skipped_segments.saturating_add(skipped);
                self.playlist.skip = Some(Skip {
                    skipped_segments: skipped,
                    recently_removed_dateranges: string_attr(&attrs, "RECENTLY-REMOVED-DATERANGES")
                        .map(|s| s.split('\t').filter(|id| !id.is_empty()).map(String::from).collect())
                        .unwrap_or_default(),
                });
            },
            HlsTag::PreloadHint => {
                let uri = string_attr(&attrs, "URI").unwrap_or_default();
                self.playlist.preload_hints.push(PreloadHint {
                    hint_type: string_attr(&attrs, "TYPE").unwrap_or_default(),
                    resolved_uri: self.resolve(&uri),
                    uri,
                    byte_range_start: u64_attr(&attrs, "BYTERANGE-START"),
                    byte_range_length: u64_attr(&attrs, "BYTERANGE-LENGTH"),
                });
            },
            HlsTag::RenditionReport => {
                self.playlist.rendition_reports.push(RenditionReport {
                    uri: string_attr(&attrs, "URI").unwrap_or_default(),
                    last_msn: u64_attr(&attrs, "LAST-MSN"),
                    last_part: u64_attr(&attrs, "LAST-PART"),
                });
            },
            HlsTag::Media => {
                let uri = string_attr(&attrs, "URI");
                self.playlist.renditions.push(Rendition {
                    media_type: string_attr(&attrs, "TYPE").unwrap_or_default(),
                    group_id: string_attr(&attrs, "GROUP-ID").unwrap_or_default(),
                    name: string_attr(&attrs, "NAME").unwrap_or_default(),
                    resolved_uri: uri.as_deref().and_then(|u| self.resolve(u)),
                    uri,
                    language: string_attr(&attrs, "LANGUAGE"),
                    assoc_language: string_attr(&attrs, "ASSOC-LANGUAGE"),
                    default: bool_attr(&attrs, "DEFAULT"),
                    autoselect: bool_attr(&attrs, "AUTOSELECT"),
                    forced: bool_attr(&attrs, "FORCED"),
                    instream_id: string_attr(&attrs, "INSTREAM-ID"),
                    characteristics: string_attr(&attrs, "CHARACTERISTICS"),
                    channels: string_attr(&attrs, "CHANNELS"),
                });
            },
            HlsTag::StreamInf => {
                let variant = Variant {
                    bandwidth: u64_attr(&attrs, "BANDWIDTH").unwrap_or(0),
                    average_bandwidth: u64_attr(&attrs, "AVERAGE-BANDWIDTH"),
                    codecs: string_attr(&attrs, "CODECS"),
                    resolution: attrs.get("RESOLUTION").and_then(|v| v.as_resolution()),
                    frame_rate: f64_attr(&attrs, "FRAME-RATE"),
                    hdcp_level: string_attr(&attrs, "HDCP-LEVEL"),
                    audio: string_attr(&attrs, "AUDIO"),
                    video: string_attr(&attrs, "VIDEO"),
                    subtitles: string_attr(&attrs, "SUBTITLES"),
                    closed_captions: string_attr(&attrs, "CLOSED-CAPTIONS"),
                    score: f64_attr(&attrs, "SCORE"),
                    attributes: attrs,
                    ..Default::default()
                };
                if let Some((previous, _)) = self.state.pending_variant.replace((event, variant)) {
                    self.options.warn(ParseWarning::PendingDiscarded {
                        tag: previous.key,
                        reason: String::from("followed by another EXT-X-STREAM-INF before its URI"),
                    });
                }
            },
            HlsTag::IFrameStreamInf => {
                let uri = string_attr(&attrs, "URI").unwrap_or_default();
                self.playlist.i_frame_variants.push(IFrameVariant {
                    resolved_uri: self.resolve(&uri),
                    uri,
                    bandwidth: u64_attr(&attrs, "BANDWIDTH").unwrap_or(0),
                    codecs: string_attr(&attrs, "CODECS"),
                    resolution: attrs.get("RESOLUTION").and_then(|v| v.as_resolution()),
                    attributes: attrs,
                });
            },
            HlsTag::SessionData => {
                self.playlist.session_data.push(SessionData {
                    data_id: string_attr(&attrs, "DATA-ID").unwrap_or_default(),
                    value: string_attr(&attrs, "VALUE"),
                    uri: string_attr(&attrs, "URI"),
                    language: string_attr(&attrs, "LANGUAGE"),
                });
            },
            HlsTag::SessionKey => {
                let key = self.make_key(&attrs);
                if key.method != "NONE" {
                    self.note_encryption(&key.method);
                }
                self.playlist.session_keys.push(key);
            },
            HlsTag::ContentSteering => {
                self.playlist.content_steering = Some(ContentSteering {
                    server_uri: string_attr(&attrs, "SERVER-URI").unwrap_or_default(),
                    pathway_id: string_attr(&attrs, "PATHWAY-ID"),
                });
            },
        }
    }

    fn process_inf(&mut self, event: TagEvent, value: &str) {
        let (duration, title) = match value.split_once(',') {
            Some((d, t)) => (d, t.trim()),
            None => (value, ""),
        };
        let duration = match parse_float(duration) {
            Ok(d) if d >= 0.0 => d,
            Ok(_) => {
                self.invalid_value(&event, "negative segment duration");
                return;
            },
            Err(e) => {
                self.invalid_value(&event, e);
                return;
            },
        };
        if let Some(previous) = self.state.draft.inf.replace(event) {
            self.options.warn(ParseWarning::PendingDiscarded {
                tag: previous.key,
                reason: String::from("followed by another EXTINF before its URI"),
            });
        }
        self.state.draft.duration = duration;
        self.state.draft.title = if title.is_empty() { None } else { Some(title.to_string()) };
    }

    fn make_key(&self, attrs: &TypedAttributes) -> Key {
        let uri = string_attr(attrs, "URI");
        Key {
            method: string_attr(attrs, "METHOD").unwrap_or_default(),
            resolved_uri: uri.as_deref().and_then(|u| self.resolve(u)),
            uri,
            iv: string_attr(attrs, "IV"),
            key_format: string_attr(attrs, "KEYFORMAT"),
            key_format_versions: string_attr(attrs, "KEYFORMATVERSIONS"),
        }
    }

    fn note_encryption(&mut self, method: &str) {
        if self.playlist.encryption_scheme.is_none() {
            self.playlist.encryption_scheme = Some(method.to_string());
        }
    }

    fn handle_uri(&mut self, uri: String) {
        let uri = self.substitute(&uri);
        if self.state.draft.inf.is_some() {
            self.finish_segment(uri);
        } else if let Some((_, mut variant)) = self.state.pending_variant.take() {
            variant.resolved_uri = self.resolve(&uri);
            variant.uri = uri;
            self.playlist.variants.push(variant);
        } else {
            self.options.warn(ParseWarning::OrphanUri { uri });
        }
    }

    fn finish_segment(&mut self, uri: String) {
        let draft = std::mem::take(&mut self.state.draft);
        if draft.discontinuity {
            self.state.discontinuities += 1;
        }
        let number = self.playlist.media_sequence
            .saturating_add(self.state.skipped_segments)
            .saturating_add(self.playlist.segments.len() as u64);
        let segment = Segment {
            number,
            duration: draft.duration,
            title: draft.title,
            resolved_uri: self.resolve(&uri),
            uri,
            presentation_time: self.state.presentation_time,
            discontinuity: draft.discontinuity,
            discontinuity_sequence: self.playlist.discontinuity_sequence.saturating_add(self.state.discontinuities),
            byte_range: draft.byte_range,
            key: self.state.key.clone(),
            map: self.state.map.clone(),
            program_date_time: draft.program_date_time,
            gap: draft.gap,
            bitrate: self.state.bitrate,
            parts: draft.parts,
        };
        self.state.presentation_time += segment.duration;
        self.playlist.segments.push(segment);
    }
}

impl ProgressiveParser for HlsParser {
    type Document = ParsedPlaylist;

    #[tracing::instrument(level = "trace", skip_all, fields(len = chunk.len()))]
    fn push(&mut self, chunk: &str) -> Result<(), ManifestError> {
        self.input.check_open()?;
        for c in chunk.chars() {
            if self.input.accept(c) {
                self.feed(c);
            }
        }
        Ok(())
    }

    fn push_bytes(&mut self, chunk: &[u8]) -> Result<(), ManifestError> {
        self.input.check_open()?;
        let text = self.input.decode(chunk);
        self.push(&text)
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn done(&mut self) -> ParsedPlaylist {
        let tail = self.input.finish();
        for c in tail.chars() {
            self.feed(c);
        }
        let (token, truncated) = self.scanner.finish();
        if let Some(token) = token {
            self.handle_token(token);
        }
        if truncated {
            self.options.warn(ParseWarning::MalformedInput {
                reason: String::from("unterminated quoted string at end of playlist"),
            });
        }
        let draft = std::mem::take(&mut self.state.draft);
        if let Some(inf) = draft.inf {
            self.options.warn(ParseWarning::PendingDiscarded {
                tag: inf.key,
                reason: String::from("no URI followed it"),
            });
        }
        self.playlist.partial_segments.extend(draft.parts);
        if let Some((tag, _)) = self.state.pending_variant.take() {
            self.options.warn(ParseWarning::PendingDiscarded {
                tag: tag.key,
                reason: String::from("no URI followed it"),
            });
        }
        self.state = HlsState::default();
        std::mem::take(&mut self.playlist)
    }

    fn reset(&mut self) {
        self.input.reset();
        self.scanner = PlaylistScanner::new();
        self.state = HlsState::default();
        self.playlist = ParsedPlaylist::default();
    }
}
