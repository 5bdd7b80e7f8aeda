// Segment addressing: the state collected from SegmentTemplate, SegmentList and SegmentBase
// elements, and its expansion into concrete segments when a Representation is complete.

use crate::values::{merge_attributes, AttrValue, ByteRange, TypedAttributes};
use super::manifest::Segment;
use super::state::join_uri;
use super::template::{resolve_template, TemplateValues};


// Upper bound on the number of segments generated for one representation, to protect against
// manifests with absurd durations.
pub(crate) const MAX_GENERATED_SEGMENTS: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressingKind {
    Template,
    List,
    Base,
}

/// One `S` element of a SegmentTimeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimelineEntry {
    pub t: Option<u64>,
    pub d: u64,
    pub r: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct InitializationRef {
    pub source_url: Option<String>,
    pub range: Option<ByteRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SegmentUrlEntry {
    pub media: Option<String>,
    pub media_range: Option<ByteRange>,
}

/// Addressing information from one SegmentTemplate, SegmentList or SegmentBase element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AddressingState {
    pub kind: AddressingKind,
    pub attributes: TypedAttributes,
    pub initialization: Option<InitializationRef>,
    pub timeline: Option<Vec<TimelineEntry>>,
    pub segment_urls: Vec<SegmentUrlEntry>,
}

impl AddressingState {
    pub(crate) fn new(kind: AddressingKind, attributes: TypedAttributes) -> AddressingState {
        AddressingState {
            kind,
            attributes,
            initialization: None,
            timeline: None,
            segment_urls: Vec::new(),
        }
    }

    /// Combine with the same kind of element at a deeper level, whose values take precedence.
    pub(crate) fn inherit(&self, child: &AddressingState) -> AddressingState {
        AddressingState {
            kind: child.kind,
            attributes: merge_attributes(&self.attributes, &child.attributes),
            initialization: child.initialization.clone().or_else(|| self.initialization.clone()),
            timeline: child.timeline.clone().or_else(|| self.timeline.clone()),
            segment_urls: if child.segment_urls.is_empty() {
                self.segment_urls.clone()
            } else {
                child.segment_urls.clone()
            },
        }
    }

    // A SegmentTemplate can only generate segments from @duration or from a timeline.
    pub(crate) fn has_template_timing(&self) -> bool {
        self.attributes.contains_key("duration") || self.timeline.is_some()
    }

    fn timescale(&self) -> u64 {
        self.attributes.get("timescale")
            .and_then(AttrValue::as_u64)
            .filter(|t| *t > 0)
            .unwrap_or(1)
    }

    fn start_number(&self) -> u64 {
        self.attributes.get("startNumber").and_then(AttrValue::as_u64).unwrap_or(1)
    }

    fn presentation_time_offset(&self) -> u64 {
        self.attributes.get("presentationTimeOffset").and_then(AttrValue::as_u64).unwrap_or(0)
    }

    // @duration in timescale units. An ISO 8601 value was converted to seconds during coercion.
    fn duration_units(&self) -> Option<f64> {
        match self.attributes.get("duration")? {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Seconds(s) => Some(s * self.timescale() as f64),
            _ => None,
        }
        .filter(|d| *d > 0.0)
    }

    fn string_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttrValue::as_str)
    }
}


/// What a representation needs to know to expand its segments.
#[derive(Debug, Clone)]
pub(crate) struct SegmentContext<'a> {
    pub representation_id: &'a str,
    pub bandwidth: u64,
    pub base_url: Option<&'a str>,
    pub period_start: f64,
    pub period_duration: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ExpandedSegments {
    pub initialization: Option<Segment>,
    pub index_range: Option<ByteRange>,
    pub segments: Vec<Segment>,
    /// Set when the segment count was capped at [`MAX_GENERATED_SEGMENTS`].
    pub truncated: bool,
}

fn make_segment(ctx: &SegmentContext, uri: String) -> Segment {
    Segment {
        resolved_uri: ctx.base_url.map(|base| join_uri(base, &uri)),
        uri,
        ..Default::default()
    }
}

fn base_segment(ctx: &SegmentContext) -> Segment {
    Segment {
        uri: ctx.base_url.unwrap_or_default().to_string(),
        resolved_uri: ctx.base_url.map(String::from),
        duration: ctx.period_duration.unwrap_or(0.0),
        presentation_time: ctx.period_start,
        ..Default::default()
    }
}

fn initialization_segment(addressing: &AddressingState, ctx: &SegmentContext) -> Option<Segment> {
    let values = TemplateValues {
        representation_id: ctx.representation_id,
        bandwidth: ctx.bandwidth,
        ..Default::default()
    };
    if addressing.kind == AddressingKind::Template {
        if let Some(template) = addressing.string_attribute("initialization") {
            return Some(make_segment(ctx, resolve_template(template, &values)));
        }
    }
    let init = addressing.initialization.as_ref()?;
    let mut segment = match &init.source_url {
        Some(url) => make_segment(ctx, resolve_template(url, &values)),
        None => base_segment(ctx),
    };
    segment.duration = 0.0;
    segment.presentation_time = 0.0;
    segment.byte_range = init.range;
    Some(segment)
}

/// Generate the segments of a representation. `addressing` is the effective addressing state
/// (ancestor levels already merged in), or `None` when the representation is addressed by its
/// base URL alone.
pub(crate) fn expand_segments(addressing: Option<&AddressingState>, ctx: &SegmentContext) -> ExpandedSegments {
    let Some(addressing) = addressing else {
        return ExpandedSegments {
            segments: vec![base_segment(ctx)],
            ..Default::default()
        };
    };
    let mut out = ExpandedSegments {
        initialization: initialization_segment(addressing, ctx),
        ..Default::default()
    };
    match addressing.kind {
        AddressingKind::Template => {
            if let Some(timeline) = &addressing.timeline {
                expand_timeline(addressing, timeline, ctx, &mut out);
            } else {
                expand_duration(addressing, ctx, &mut out);
            }
        },
        AddressingKind::List => expand_list(addressing, ctx, &mut out),
        AddressingKind::Base => {
            out.index_range = addressing.attributes.get("indexRange").and_then(AttrValue::as_range);
            out.segments.push(base_segment(ctx));
        },
    }
    out
}

fn expand_timeline(addressing: &AddressingState, timeline: &[TimelineEntry], ctx: &SegmentContext, out: &mut ExpandedSegments) {
    let Some(media) = addressing.string_attribute("media") else {
        return;
    };
    let timescale = addressing.timescale() as f64;
    let pto = addressing.presentation_time_offset();
    let period_end = ctx.period_duration.map(|d| ((d * timescale) as u64).saturating_add(pto));
    let mut number = addressing.start_number();
    let mut time = 0u64;
    for (i, s) in timeline.iter().enumerate() {
        if let Some(t) = s.t {
            time = t;
        }
        if s.d == 0 {
            continue;
        }
        let repeats = if s.r >= 0 {
            s.r as u64
        } else {
            // r = -1: repeat until the start of the next S element, or the end of the period
            let end = timeline.get(i + 1).and_then(|next| next.t).or(period_end);
            match end {
                Some(end) if end > time => (end - time).div_ceil(s.d).saturating_sub(1),
                _ => 0,
            }
        };
        for _ in 0..=repeats {
            if out.segments.len() as u64 >= MAX_GENERATED_SEGMENTS {
                out.truncated = true;
                return;
            }
            let values = TemplateValues {
                representation_id: ctx.representation_id,
                bandwidth: ctx.bandwidth,
                number: Some(number),
                time: Some(time),
            };
            let mut segment = make_segment(ctx, resolve_template(media, &values));
            segment.number = number;
            segment.time = Some(time);
            segment.duration = s.d as f64 / timescale;
            segment.presentation_time = ctx.period_start + (time as f64 - pto as f64) / timescale;
            out.segments.push(segment);
            // a timeline running past the largest representable time or number is malformed
            let (Some(next_number), Some(next_time)) = (number.checked_add(1), time.checked_add(s.d)) else {
                out.truncated = true;
                return;
            };
            number = next_number;
            time = next_time;
        }
    }
}

fn expand_duration(addressing: &AddressingState, ctx: &SegmentContext, out: &mut ExpandedSegments) {
    let (Some(media), Some(duration)) = (addressing.string_attribute("media"), addressing.duration_units()) else {
        return;
    };
    let timescale = addressing.timescale() as f64;
    let start_number = addressing.start_number();
    let mut count = match ctx.period_duration {
        Some(period) => (period * timescale / duration).ceil() as u64,
        // a live presentation without a known period duration has no fixed segment list
        None => 0,
    };
    if let Some(end) = addressing.attributes.get("endNumber").and_then(AttrValue::as_u64) {
        count = count.min(end.saturating_add(1).saturating_sub(start_number));
    }
    if count > MAX_GENERATED_SEGMENTS {
        count = MAX_GENERATED_SEGMENTS;
        out.truncated = true;
    }
    let segment_duration = duration / timescale;
    for i in 0..count {
        let Some(number) = start_number.checked_add(i) else {
            out.truncated = true;
            return;
        };
        let time = (i as f64 * duration) as u64;
        let values = TemplateValues {
            representation_id: ctx.representation_id,
            bandwidth: ctx.bandwidth,
            number: Some(number),
            time: Some(time),
        };
        let mut segment = make_segment(ctx, resolve_template(media, &values));
        segment.number = number;
        segment.time = Some(time);
        segment.duration = segment_duration;
        segment.presentation_time = ctx.period_start + i as f64 * segment_duration;
        out.segments.push(segment);
    }
}

fn expand_list(addressing: &AddressingState, ctx: &SegmentContext, out: &mut ExpandedSegments) {
    let timescale = addressing.timescale() as f64;
    // only as many timeline durations as there are SegmentURLs are ever needed
    let mut durations = addressing.timeline.iter()
        .flatten()
        .flat_map(|s| std::iter::repeat(s.d as f64 / timescale).take((s.r.max(0) as usize).saturating_add(1)))
        .take(addressing.segment_urls.len());
    let default_duration = addressing.duration_units().map_or(0.0, |d| d / timescale);
    let start_number = addressing.start_number();
    let mut presentation_time = ctx.period_start;
    for (i, entry) in addressing.segment_urls.iter().enumerate() {
        let mut segment = match &entry.media {
            Some(media) => make_segment(ctx, media.clone()),
            None => base_segment(ctx),
        };
        segment.number = start_number.saturating_add(i as u64);
        segment.duration = durations.next().unwrap_or(default_duration);
        segment.presentation_time = presentation_time;
        segment.byte_range = entry.media_range;
        presentation_time += segment.duration;
        out.segments.push(segment);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn template(attrs: &[(&str, AttrValue)]) -> AddressingState {
        let attributes = attrs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        AddressingState::new(AddressingKind::Template, attributes)
    }

    fn ctx(period_duration: Option<f64>) -> SegmentContext<'static> {
        SegmentContext {
            representation_id: "v1",
            bandwidth: 500000,
            base_url: Some("https://cdn.example.com/dash/"),
            period_start: 0.0,
            period_duration,
        }
    }

    #[test]
    fn test_duration_template() {
        let t = template(&[
            ("media", AttrValue::Str("$RepresentationID$/$Number$.m4s".into())),
            ("initialization", AttrValue::Str("$RepresentationID$/init.mp4".into())),
            ("timescale", AttrValue::Int(1000)),
            ("duration", AttrValue::Int(4000)),
        ]);
        let out = expand_segments(Some(&t), &ctx(Some(10.0)));
        assert_eq!(out.segments.len(), 3);
        assert_eq!(out.segments[2].uri, "v1/3.m4s");
        assert_eq!(out.segments[2].resolved_uri.as_deref(), Some("https://cdn.example.com/dash/v1/3.m4s"));
        assert_eq!(out.segments[1].presentation_time, 4.0);
        assert_eq!(out.initialization.map(|s| s.uri), Some(String::from("v1/init.mp4")));
    }

    #[test]
    fn test_timeline_repeat_to_period_end() {
        let mut t = template(&[
            ("media", AttrValue::Str("$Time$.m4s".into())),
            ("timescale", AttrValue::Int(10)),
        ]);
        t.timeline = Some(vec![
            TimelineEntry { t: Some(0), d: 20, r: 1 },
            TimelineEntry { t: None, d: 10, r: -1 },
        ]);
        let out = expand_segments(Some(&t), &ctx(Some(7.0)));
        let uris: Vec<&str> = out.segments.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["0.m4s", "20.m4s", "40.m4s", "50.m4s", "60.m4s"]);
        assert_eq!(out.segments[4].number, 5);
    }

    #[test]
    fn test_inherit_prefers_child() {
        let parent = template(&[("timescale", AttrValue::Int(1000)), ("media", AttrValue::Str("a".into()))]);
        let child = template(&[("media", AttrValue::Str("b".into()))]);
        let merged = parent.inherit(&child);
        assert_eq!(merged.attributes.get("timescale"), Some(&AttrValue::Int(1000)));
        assert_eq!(merged.string_attribute("media"), Some("b"));
        assert!(!merged.has_template_timing());
    }

    #[test]
    fn test_no_addressing_uses_base_url() {
        let out = expand_segments(None, &ctx(Some(30.0)));
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].uri, "https://cdn.example.com/dash/");
        assert_eq!(out.segments[0].duration, 30.0);
    }
}
