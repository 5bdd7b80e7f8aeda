// The DASH parse session: routes MPD tokens to the element table, maintains the element stack,
// and assembles the manifest.
//
// Each element is processed when it starts (its attributes are known at that point) and again
// when it ends, which is where elements that collect child content (Representation,
// SegmentTemplate, ContentProtection, EventStream...) are completed. A childless element is
// started and ended in one step. Elements that are ignored, unsupported or that fail validation
// are skipped together with their whole subtree.

use tracing::trace;
use crate::{ManifestError, ProgressiveParser};
use crate::dispatch::{route, validate, Route};
use crate::options::ParserOptions;
use crate::scanner::{SessionInput, TagEvent};
use crate::values::{AttrValue, TypedAttributes};
use crate::warning::ParseWarning;
use super::addressing::{expand_segments, AddressingKind, AddressingState, InitializationRef,
                        SegmentContext, SegmentUrlEntry, TimelineEntry};
use super::manifest::*;
use super::pending::{BufferedChild, PendingId, PendingProcess, PendingRegistry};
use super::scanner::{MpdScanner, MpdToken};
use super::state::{Level, ResolutionState};
use super::tags::{dash_coercion, DashTag};


const MP4_PROTECTION_SCHEME: &str = "urn:mpeg:dash:mp4protection:2011";

fn string_attr(attrs: &TypedAttributes, name: &str) -> Option<String> {
    attrs.get(name).map(|v| v.to_string())
}

fn seconds_attr(attrs: &TypedAttributes, name: &str) -> Option<f64> {
    attrs.get(name).and_then(AttrValue::as_f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Known(DashTag),
    Custom,
    // held by a pending parent, to be applied when the parent is finalized
    Deferred,
    Skipped,
}

#[derive(Debug, Clone)]
struct Frame {
    event: TagEvent,
    kind: FrameKind,
    pending: Option<PendingId>,
}


/// A progressive MPD parser.
///
/// Example
/// ```rust
/// use stream_manifest::{dash::DashParser, ParserOptions, ProgressiveParser};
///
/// let mut parser = DashParser::new(ParserOptions::new().with_uri("https://example.com/dash/manifest.mpd"));
/// parser.push(r#"<MPD mediaPresentationDuration="PT8S"><Period><AdaptationSet mimeType="video/mp4">"#).unwrap();
/// parser.push(r#"<SegmentTemplate media="$Number$.m4s" duration="4"/>"#).unwrap();
/// parser.push(r#"<Representation id="v1" bandwidth="800000"/></AdaptationSet></Period></MPD>"#).unwrap();
/// let mpd = parser.done();
/// assert_eq!(mpd.representations[0].segments.len(), 2);
/// assert_eq!(mpd.representations[0].segments[1].resolved_uri.as_deref(),
///            Some("https://example.com/dash/2.m4s"));
/// ```
pub struct DashParser {
    options: ParserOptions,
    known_keys: Vec<&'static str>,
    input: SessionInput,
    scanner: MpdScanner,
    frames: Vec<Frame>,
    state: ResolutionState,
    pending: PendingRegistry,
    // the SegmentTemplate, SegmentList or SegmentBase being read, once it is no longer pending
    addressing: Option<(Level, AddressingState)>,
    timeline: Vec<TimelineEntry>,
    protection: Option<ContentProtection>,
    program: Option<ProgramInformation>,
    event_stream: Option<EventStream>,
    manifest: ParsedManifest,
}

impl DashParser {
    pub fn new(options: ParserOptions) -> DashParser {
        let state = ResolutionState::new(options.uri());
        DashParser {
            options,
            known_keys: DashTag::keys(),
            input: SessionInput::default(),
            scanner: MpdScanner::new(),
            frames: Vec::new(),
            state,
            pending: PendingRegistry::default(),
            addressing: None,
            timeline: Vec::new(),
            protection: None,
            program: None,
            event_stream: None,
            manifest: ParsedManifest::default(),
        }
    }

    fn clear_session(&mut self) {
        self.scanner = MpdScanner::new();
        self.frames.clear();
        self.state = ResolutionState::new(self.options.uri());
        self.pending = PendingRegistry::default();
        self.addressing = None;
        self.timeline.clear();
        self.protection = None;
        self.program = None;
        self.event_stream = None;
    }

    fn feed(&mut self, c: char) {
        if let Some(token) = self.scanner.feed(c) {
            self.handle_token(token);
        }
    }

    fn handle_token(&mut self, token: MpdToken) {
        match token {
            MpdToken::Open(event) => {
                let frame = self.start_element(event, false);
                self.frames.push(frame);
            },
            MpdToken::Leaf(event) => {
                let frame = self.start_element(event, true);
                self.end_element(frame);
            },
            MpdToken::Close(key) => self.close(&key),
        }
    }

    fn close(&mut self, key: &str) {
        let Some(pos) = self.frames.iter().rposition(|f| f.event.key == key) else {
            trace!("ignoring end tag </{key}> with no matching start tag");
            return;
        };
        // elements left open inside this one end with it
        while self.frames.len() > pos {
            if let Some(frame) = self.frames.pop() {
                self.end_element(frame);
            }
        }
    }

    fn parent_event(&self) -> Option<&TagEvent> {
        self.frames.last().map(|f| &f.event)
    }

    fn parent_key(&self) -> String {
        self.parent_event().map(|e| e.key.clone()).unwrap_or_default()
    }

    // The pending process of the parent element, while it is still waiting.
    fn parent_pending(&self) -> Option<PendingId> {
        self.frames.last()
            .and_then(|f| f.pending)
            .filter(|id| self.pending.is_open(*id))
    }

    // The innermost enclosing MPD, Period, AdaptationSet or Representation.
    fn scope_level(&self) -> Option<Level> {
        self.frames.iter().rev().find_map(|f| match f.kind {
            FrameKind::Known(DashTag::Mpd) => Some(Level::Mpd),
            FrameKind::Known(DashTag::Period) => Some(Level::Period),
            FrameKind::Known(DashTag::AdaptationSet) => Some(Level::AdaptationSet),
            FrameKind::Known(DashTag::Representation) => Some(Level::Representation),
            _ => None,
        })
    }

    // The addressing element that children such as Initialization or SegmentTimeline belong to.
    fn owner_state(&mut self) -> Option<&mut AddressingState> {
        match self.parent_pending() {
            Some(id) => self.pending.get_mut(id).map(|p| &mut p.state),
            None => self.addressing.as_mut().map(|(_, s)| s),
        }
    }

    fn start_element(&mut self, event: TagEvent, leaf: bool) -> Frame {
        if self.frames.last().is_some_and(|f| f.kind == FrameKind::Skipped) {
            return Frame { event, kind: FrameKind::Skipped, pending: None };
        }
        let known = DashTag::from_key(&event.key);
        match route(&event.key, known, &self.known_keys, &self.options) {
            Route::Ignored | Route::Unsupported => Frame { event, kind: FrameKind::Skipped, pending: None },
            Route::Custom(handler) => {
                let event = self.options.transform(event);
                let parent = self.frames.last().map(|f| &f.event);
                handler(&event, parent, &mut self.manifest.custom);
                Frame { event, kind: FrameKind::Custom, pending: None }
            },
            Route::Known(tag) => {
                let event = self.options.transform(event);
                let Some(attrs) = validate(&event, tag.required(), |name| dash_coercion(tag, name), &self.options) else {
                    return Frame { event, kind: FrameKind::Skipped, pending: None };
                };
                if let Some(id) = self.parent_pending() {
                    if leaf && !self.pending.waits_for(id, &event.key) {
                        trace!("deferring <{}> until its parent is complete", event.key);
                        if let Some(process) = self.pending.get_mut(id) {
                            process.buffered.push(BufferedChild { tag, attributes: attrs });
                        }
                        return Frame { event, kind: FrameKind::Deferred, pending: None };
                    }
                }
                let pending = self.process_start(tag, &event, attrs, leaf);
                Frame { event, kind: FrameKind::Known(tag), pending }
            },
        }
    }

    fn process_start(&mut self, tag: DashTag, event: &TagEvent, attrs: TypedAttributes, leaf: bool) -> Option<PendingId> {
        trace!("DASH element {}", event.key);
        match tag {
            DashTag::Mpd => {
                self.start_mpd(&attrs);
                self.state.enter(Level::Mpd, attrs);
            },
            DashTag::Period => {
                self.start_period(&attrs);
                self.state.enter(Level::Period, attrs);
            },
            DashTag::AdaptationSet => self.state.enter(Level::AdaptationSet, attrs),
            DashTag::Representation => self.state.enter(Level::Representation, attrs),
            DashTag::BaseUrl => match event.value.as_deref().map(str::trim) {
                Some(uri) if !uri.is_empty() => {
                    let parent = self.parent_key();
                    self.state.add_base_url(uri, attrs, &parent);
                },
                _ => self.options.warn(ParseWarning::InvalidTagValue {
                    tag: event.key.clone(),
                    value: None,
                    reason: String::from("empty BaseURL"),
                }),
            },
            DashTag::SegmentTemplate | DashTag::SegmentList | DashTag::SegmentBase => {
                return self.start_addressing(tag, event, attrs, leaf);
            },
            DashTag::SegmentTimeline => self.timeline.clear(),
            DashTag::S => self.timeline.push(TimelineEntry {
                t: attrs.get("t").and_then(AttrValue::as_u64),
                d: attrs.get("d").and_then(AttrValue::as_u64).unwrap_or(0),
                r: attrs.get("r").and_then(AttrValue::as_i64).unwrap_or(0),
            }),
            DashTag::SegmentUrl => self.add_segment_url(event, &attrs),
            DashTag::Initialization | DashTag::RepresentationIndex => self.apply_addressing_child(tag, &attrs),
            DashTag::ContentProtection => {
                self.protection = Some(ContentProtection {
                    scheme_id_uri: string_attr(&attrs, "schemeIdUri").unwrap_or_default(),
                    value: string_attr(&attrs, "value"),
                    default_kid: string_attr(&attrs, "cenc:default_KID"),
                    pssh: None,
                    attributes: attrs,
                });
            },
            DashTag::Pssh => {
                if let Some(protection) = self.protection.as_mut() {
                    protection.pssh = event.value.clone();
                }
            },
            DashTag::Label => {
                if let Some(level) = self.scope_level() {
                    self.state.level_mut(level).label = event.value.clone();
                }
            },
            DashTag::Location => {
                if let Some(location) = &event.value {
                    self.manifest.locations.push(location.clone());
                }
            },
            DashTag::UtcTiming => self.manifest.utc_timings.push(UtcTiming {
                scheme_id_uri: string_attr(&attrs, "schemeIdUri").unwrap_or_default(),
                value: string_attr(&attrs, "value"),
            }),
            DashTag::ProgramInformation => {
                self.program = Some(ProgramInformation {
                    lang: string_attr(&attrs, "lang"),
                    more_information_url: string_attr(&attrs, "moreInformationURL"),
                    ..Default::default()
                });
            },
            DashTag::Title | DashTag::Source | DashTag::Copyright => {
                if let Some(program) = self.program.as_mut() {
                    let field = match tag {
                        DashTag::Title => &mut program.title,
                        DashTag::Source => &mut program.source,
                        _ => &mut program.copyright,
                    };
                    *field = event.value.clone();
                }
            },
            DashTag::EventStream => {
                self.event_stream = Some(EventStream {
                    period_id: self.state.current_period.as_ref().and_then(|p| p.id.clone()),
                    scheme_id_uri: string_attr(&attrs, "schemeIdUri").unwrap_or_default(),
                    value: string_attr(&attrs, "value"),
                    timescale: attrs.get("timescale").and_then(AttrValue::as_u64).filter(|t| *t > 0).unwrap_or(1),
                    events: Vec::new(),
                });
            },
            DashTag::Event => self.add_event(event, &attrs),
            DashTag::Role | DashTag::Accessibility | DashTag::AudioChannelConfiguration |
            DashTag::EssentialProperty | DashTag::SupplementalProperty | DashTag::Viewpoint => {
                let (Some(kind), Some(level)) = (tag.descriptor_kind(), self.scope_level()) else {
                    return None;
                };
                self.state.level_mut(level).descriptors.push(Descriptor {
                    kind,
                    scheme_id_uri: string_attr(&attrs, "schemeIdUri").unwrap_or_default(),
                    value: string_attr(&attrs, "value"),
                    id: string_attr(&attrs, "id"),
                });
            },
        }
        None
    }

    fn end_element(&mut self, frame: Frame) {
        let FrameKind::Known(tag) = frame.kind else {
            return;
        };
        match tag {
            DashTag::Mpd | DashTag::Period | DashTag::AdaptationSet => self.state.leave(),
            DashTag::Representation => {
                self.finish_representation();
                self.state.leave();
            },
            t if t.is_addressing() => self.end_addressing(frame.event, frame.pending),
            DashTag::SegmentTimeline => self.end_timeline(frame.event),
            DashTag::ContentProtection => {
                let Some(protection) = self.protection.take() else {
                    return;
                };
                if self.manifest.encryption_scheme.is_none() &&
                    protection.scheme_id_uri.eq_ignore_ascii_case(MP4_PROTECTION_SCHEME)
                {
                    self.manifest.encryption_scheme = protection.value.clone();
                }
                if let Some(level) = self.scope_level() {
                    self.state.level_mut(level).content_protections.push(protection);
                }
            },
            DashTag::ProgramInformation => {
                if let Some(program) = self.program.take() {
                    self.manifest.program_information.push(program);
                }
            },
            DashTag::EventStream => {
                if let Some(stream) = self.event_stream.take() {
                    self.manifest.event_streams.push(stream);
                }
            },
            _ => (),
        }
    }

    fn start_mpd(&mut self, attrs: &TypedAttributes) {
        let m = &mut self.manifest;
        m.manifest_type = match attrs.get("type").and_then(AttrValue::as_str) {
            Some("dynamic") => ManifestType::Dynamic,
            _ => ManifestType::Static,
        };
        m.id = string_attr(attrs, "id");
        m.profiles = string_attr(attrs, "profiles");
        m.min_buffer_time = seconds_attr(attrs, "minBufferTime");
        m.media_presentation_duration = seconds_attr(attrs, "mediaPresentationDuration");
        m.minimum_update_period = seconds_attr(attrs, "minimumUpdatePeriod");
        m.time_shift_buffer_depth = seconds_attr(attrs, "timeShiftBufferDepth");
        m.suggested_presentation_delay = seconds_attr(attrs, "suggestedPresentationDelay");
        m.max_segment_duration = seconds_attr(attrs, "maxSegmentDuration");
        m.availability_start_time = attrs.get("availabilityStartTime").and_then(AttrValue::as_date);
        m.availability_end_time = attrs.get("availabilityEndTime").and_then(AttrValue::as_date);
        m.publish_time = attrs.get("publishTime").and_then(AttrValue::as_date);
    }

    // The start of a period is its @start, else the end of the previous period. Its duration is
    // its @duration, else whatever remains of the presentation.
    fn start_period(&mut self, attrs: &TypedAttributes) {
        let start = seconds_attr(attrs, "start")
            .or(self.state.previous_period_end)
            .unwrap_or(0.0);
        let duration = seconds_attr(attrs, "duration")
            .or_else(|| self.manifest.media_presentation_duration.map(|d| d - start))
            .filter(|d| *d >= 0.0);
        let info = PeriodInfo {
            id: string_attr(attrs, "id"),
            start,
            duration,
        };
        self.state.previous_period_end = duration.map(|d| start + d);
        self.state.period_index = self.manifest.periods.len();
        self.state.current_period = Some(info.clone());
        self.manifest.periods.push(info);
    }

    fn start_addressing(&mut self, tag: DashTag, event: &TagEvent, attrs: TypedAttributes, leaf: bool) -> Option<PendingId> {
        let kind = match tag {
            DashTag::SegmentTemplate => AddressingKind::Template,
            DashTag::SegmentList => AddressingKind::List,
            _ => AddressingKind::Base,
        };
        let Some(level) = self.scope_level() else {
            trace!("ignoring <{}> outside of any Period", event.key);
            return None;
        };
        let state = AddressingState::new(kind, attrs);
        // a childless element has nothing to wait for; a deeper level may still complete it
        if leaf {
            self.addressing = Some((level, state));
            return None;
        }
        let waiting_for: &[&str] = match kind {
            AddressingKind::Template if !self.state.merged_addressing(kind, level, Some(&state))
                .is_some_and(|m| m.has_template_timing()) => &["SegmentTimeline"],
            AddressingKind::List if !state.attributes.contains_key("xlink:href") => &["SegmentURL"],
            _ => &[],
        };
        if waiting_for.is_empty() {
            self.addressing = Some((level, state));
            return None;
        }
        let process = PendingProcess::new(event.clone(), level, waiting_for, state);
        let id = self.pending.register(process);
        self.options.debug(&format!("<{}> waiting for {}", event.key, waiting_for.join(", ")));
        Some(id)
    }

    fn finalize(&mut self, process: PendingProcess) {
        self.options.debug(&format!("<{}> complete", process.event.key));
        self.addressing = Some((process.level, process.state));
        for child in process.buffered {
            self.apply_addressing_child(child.tag, &child.attributes);
        }
    }

    fn end_addressing(&mut self, event: TagEvent, pending: Option<PendingId>) {
        if let Some(process) = pending.and_then(|id| self.pending.discard(id)) {
            self.options.warn(ParseWarning::PendingDiscarded {
                tag: event.key,
                reason: format!("element ended before its {} child", process.missing().join(", ")),
            });
            return;
        }
        if let Some((level, state)) = self.addressing.take() {
            self.state.level_mut(level).set_addressing(state);
        }
    }

    fn end_timeline(&mut self, event: TagEvent) {
        let timeline = std::mem::take(&mut self.timeline);
        if let Some(owner) = self.owner_state() {
            owner.timeline = Some(timeline);
        }
        if let Some(id) = self.parent_pending() {
            if let Some(process) = self.pending.satisfy(id, event) {
                self.finalize(process);
            }
        }
    }

    fn add_segment_url(&mut self, event: &TagEvent, attrs: &TypedAttributes) {
        let entry = SegmentUrlEntry {
            media: string_attr(attrs, "media"),
            media_range: attrs.get("mediaRange").and_then(AttrValue::as_range),
        };
        if let Some(owner) = self.owner_state() {
            owner.segment_urls.push(entry);
        }
        if let Some(id) = self.parent_pending() {
            if let Some(process) = self.pending.satisfy(id, event.clone()) {
                self.finalize(process);
            }
        }
    }

    fn apply_addressing_child(&mut self, tag: DashTag, attrs: &TypedAttributes) {
        let Some(owner) = self.owner_state() else {
            return;
        };
        match tag {
            DashTag::Initialization => {
                owner.initialization = Some(InitializationRef {
                    source_url: string_attr(attrs, "sourceURL"),
                    range: attrs.get("range").and_then(AttrValue::as_range),
                });
            },
            DashTag::RepresentationIndex => {
                if let Some(range) = attrs.get("range") {
                    owner.attributes.entry(String::from("indexRange")).or_insert_with(|| range.clone());
                }
            },
            _ => (),
        }
    }

    fn add_event(&mut self, event: &TagEvent, attrs: &TypedAttributes) {
        let Some(stream) = self.event_stream.as_mut() else {
            return;
        };
        let timescale = stream.timescale as f64;
        let duration = match attrs.get("duration") {
            Some(AttrValue::Seconds(s)) => Some(*s),
            Some(v) => v.as_f64().map(|d| d / timescale),
            None => None,
        };
        stream.events.push(Event {
            id: string_attr(attrs, "id"),
            presentation_time: attrs.get("presentationTime").and_then(AttrValue::as_f64).unwrap_or(0.0) / timescale,
            duration,
            message_data: string_attr(attrs, "messageData").or_else(|| event.value.clone()),
        });
    }

    // A SegmentTemplate that is still without @duration and SegmentTimeline once every level has
    // been merged cannot generate segments, so the Representation falls back to its base URL.
    fn check_template_timing(&self, addressing: &AddressingState, id: &str) -> bool {
        if addressing.kind != AddressingKind::Template || addressing.has_template_timing() {
            return true;
        }
        self.options.warn(ParseWarning::PendingDiscarded {
            tag: String::from("SegmentTemplate"),
            reason: format!("Representation {id} has no @duration or SegmentTimeline"),
        });
        false
    }

    // Expand the segments of the Representation that just ended, once per active base URL.
    fn finish_representation(&mut self) {
        let attributes = self.state.effective_attributes();
        let own = &self.state.representation.attributes;
        let id = string_attr(own, "id").unwrap_or_default();
        let bandwidth = own.get("bandwidth").and_then(AttrValue::as_u64).unwrap_or(0);
        let period = self.state.current_period.clone().unwrap_or_default();
        let adaptation_set_id = string_attr(&self.state.adaptation_set.attributes, "id");
        let addressing = self.state.effective_addressing()
            .filter(|a| self.check_template_timing(a, &id));
        let content_protections = self.state.content_protections();
        let descriptors = self.state.descriptors();
        let label = self.state.label();
        let bases: Vec<Option<String>> = if self.state.base_urls.is_empty() {
            vec![None]
        } else {
            self.state.base_urls.iter().map(|b| Some(b.uri.clone())).collect()
        };
        for base in bases {
            let ctx = SegmentContext {
                representation_id: &id,
                bandwidth,
                base_url: base.as_deref(),
                period_start: period.start,
                period_duration: period.duration,
            };
            let expanded = expand_segments(addressing.as_ref(), &ctx);
            if expanded.truncated {
                self.options.warn(ParseWarning::MalformedInput {
                    reason: format!("segment list of Representation {id} truncated"),
                });
            }
            self.manifest.representations.push(Representation {
                id: id.clone(),
                period_index: self.state.period_index,
                period_id: period.id.clone(),
                adaptation_set_id: adaptation_set_id.clone(),
                base_url: base,
                bandwidth,
                mime_type: string_attr(&attributes, "mimeType"),
                content_type: string_attr(&attributes, "contentType"),
                codecs: string_attr(&attributes, "codecs"),
                width: attributes.get("width").and_then(AttrValue::as_u64),
                height: attributes.get("height").and_then(AttrValue::as_u64),
                frame_rate: seconds_attr(&attributes, "frameRate"),
                audio_sampling_rate: string_attr(&attributes, "audioSamplingRate"),
                lang: string_attr(&attributes, "lang"),
                label: label.clone(),
                attributes: attributes.clone(),
                content_protections: content_protections.clone(),
                descriptors: descriptors.clone(),
                initialization: expanded.initialization,
                index_range: expanded.index_range,
                segments: expanded.segments,
            });
        }
    }
}

impl ProgressiveParser for DashParser {
    type Document = ParsedManifest;

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
    fn done(&mut self) -> ParsedManifest {
        let tail = self.input.finish();
        for c in tail.chars() {
            self.feed(c);
        }
        let (tokens, truncated) = self.scanner.finish();
        for token in tokens {
            self.handle_token(token);
        }
        if truncated {
            self.options.warn(ParseWarning::MalformedInput {
                reason: String::from("document ended inside markup"),
            });
        }
        if let Some(frame) = self.frames.last() {
            self.options.warn(ParseWarning::MalformedInput {
                reason: format!("document ended inside <{}>", frame.event.key),
            });
        }
        for process in self.pending.drain() {
            self.options.warn(ParseWarning::PendingDiscarded {
                tag: process.event.key.clone(),
                reason: format!("document ended before its {} child", process.missing().join(", ")),
            });
        }
        self.clear_session();
        std::mem::take(&mut self.manifest)
    }

    fn reset(&mut self) {
        self.input.reset();
        self.clear_session();
        self.manifest = ParsedManifest::default();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_template_waits_for_timeline() {
        let mut parser = DashParser::new(ParserOptions::new());
        let mpd = parser.parse(r#"<MPD mediaPresentationDuration="PT6S"><Period>
  <AdaptationSet mimeType="video/mp4">
    <SegmentTemplate media="$Time$.m4s" timescale="1">
      <Initialization sourceURL="init.mp4"/>
      <SegmentTimeline><S t="0" d="2" r="2"/></SegmentTimeline>
    </SegmentTemplate>
    <Representation id="v" bandwidth="1"/>
  </AdaptationSet></Period></MPD>"#);
        let rep = &mpd.representations[0];
        let uris: Vec<&str> = rep.segments.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["0.m4s", "2.m4s", "4.m4s"]);
        assert_eq!(rep.initialization.as_ref().map(|s| s.uri.as_str()), Some("init.mp4"));
    }

    #[test]
    fn test_mismatched_end_tags_close_inner_elements() {
        let mut parser = DashParser::new(ParserOptions::new());
        let mpd = parser.parse(r#"<MPD><Period><AdaptationSet mimeType="audio/mp4"><Representation id="a" bandwidth="64000"><BaseURL>a.mp4</BaseURL></AdaptationSet></Period></MPD>"#);
        assert_eq!(mpd.representations.len(), 1);
        assert_eq!(mpd.representations[0].segments[0].uri, "a.mp4");
    }
}
