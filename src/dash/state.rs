// Resolution state shared by the element processors of one parse session: the active base URLs,
// and the attributes and addressing elements collected at each level of the MPD hierarchy.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;
use crate::values::{merge_attributes, TypedAttributes};
use super::addressing::{AddressingKind, AddressingState};
use super::manifest::{ContentProtection, Descriptor, PeriodInfo};


lazy_static! {
    static ref URI_SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap();
}

pub(crate) fn is_absolute_url(s: &str) -> bool {
    URI_SCHEME.is_match(s)
}

/// Resolve `relative` against `base`.
///
/// The query portion of the base URL (which is either the manifest URL or the value of a BaseURL
/// element) is kept when the relative URL has none of its own, so that authentication tokens in
/// the manifest URL reach the media segments.
///
/// merge: https://example.com/manifest.mpd?auth=secret + /video42.mp4 =>
///   https://example.com/video42.mp4?auth=secret
pub(crate) fn join_uri(base: &str, relative: &str) -> String {
    if is_absolute_url(relative) {
        return relative.to_string();
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(mut merged) = base_url.join(relative) {
            if merged.query().is_none() {
                merged.set_query(base_url.query());
            }
            return merged.to_string();
        }
    }
    // base is itself relative (no manifest URL was supplied)
    if relative.starts_with('/') {
        return relative.to_string();
    }
    match base.rfind('/') {
        Some(i) => format!("{}{relative}", &base[..=i]),
        None => relative.to_string(),
    }
}


/// An active base URL. `parent_key` is the element containing the BaseURL element, or `None` for
/// the manifest URL supplied in the parser options.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BaseUrlEntry {
    pub uri: String,
    pub attributes: TypedAttributes,
    pub parent_key: Option<String>,
}

/// Apply one BaseURL element to the list of active base URLs.
///
/// An absolute URL is appended to the list as an additional base, next to the manifest URL and any
/// earlier absolute bases. A relative URL is resolved against every active base that does not come
/// from the same parent element, and those resolved URLs replace the bases they were resolved
/// against; bases from the same parent are kept as they are. A relative URL with nothing to be
/// resolved against is appended as it is.
pub(crate) fn apply_base_url(
    active: &[BaseUrlEntry],
    uri: &str,
    attributes: TypedAttributes,
    parent_key: &str) -> Vec<BaseUrlEntry>
{
    if is_absolute_url(uri) {
        let mut out = active.to_vec();
        out.push(BaseUrlEntry {
            uri: uri.to_string(),
            attributes,
            parent_key: Some(parent_key.to_string()),
        });
        return out;
    }
    let (same_parent, others): (Vec<&BaseUrlEntry>, Vec<&BaseUrlEntry>) = active.iter()
        .partition(|e| e.parent_key.as_deref() == Some(parent_key));
    let mut out: Vec<BaseUrlEntry> = same_parent.into_iter().cloned().collect();
    if others.is_empty() {
        out.push(BaseUrlEntry {
            uri: uri.to_string(),
            attributes,
            parent_key: Some(parent_key.to_string()),
        });
    } else {
        for base in others {
            out.push(BaseUrlEntry {
                uri: join_uri(&base.uri, uri),
                attributes: merge_attributes(&base.attributes, &attributes),
                parent_key: Some(parent_key.to_string()),
            });
        }
    }
    out
}


/// The levels of the MPD hierarchy that carry inheritable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Mpd,
    Period,
    AdaptationSet,
    Representation,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LevelState {
    pub attributes: TypedAttributes,
    pub segment_template: Option<AddressingState>,
    pub segment_list: Option<AddressingState>,
    pub segment_base: Option<AddressingState>,
    pub content_protections: Vec<ContentProtection>,
    pub descriptors: Vec<Descriptor>,
    pub label: Option<String>,
}

impl LevelState {
    fn addressing(&self, kind: AddressingKind) -> Option<&AddressingState> {
        match kind {
            AddressingKind::Template => self.segment_template.as_ref(),
            AddressingKind::List => self.segment_list.as_ref(),
            AddressingKind::Base => self.segment_base.as_ref(),
        }
    }

    pub(crate) fn set_addressing(&mut self, state: AddressingState) {
        match state.kind {
            AddressingKind::Template => self.segment_template = Some(state),
            AddressingKind::List => self.segment_list = Some(state),
            AddressingKind::Base => self.segment_base = Some(state),
        }
    }

    // The addressing kind defined at this level, in order of precedence.
    fn addressing_kind(&self) -> Option<AddressingKind> {
        [AddressingKind::Template, AddressingKind::List, AddressingKind::Base]
            .into_iter()
            .find(|k| self.addressing(*k).is_some())
    }
}


#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionState {
    pub base_urls: Vec<BaseUrlEntry>,
    base_url_snapshots: Vec<Vec<BaseUrlEntry>>,
    pub mpd: LevelState,
    pub period: LevelState,
    pub adaptation_set: LevelState,
    pub representation: LevelState,
    pub current_period: Option<PeriodInfo>,
    pub period_index: usize,
    // end of the previous period, when its start and duration were both known
    pub previous_period_end: Option<f64>,
}

impl ResolutionState {
    pub(crate) fn new(seed: Option<&str>) -> ResolutionState {
        ResolutionState {
            base_urls: seed.map(|uri| BaseUrlEntry {
                uri: uri.to_string(),
                attributes: TypedAttributes::new(),
                parent_key: None,
            }).into_iter().collect(),
            ..Default::default()
        }
    }

    pub(crate) fn level_mut(&mut self, level: Level) -> &mut LevelState {
        match level {
            Level::Mpd => &mut self.mpd,
            Level::Period => &mut self.period,
            Level::AdaptationSet => &mut self.adaptation_set,
            Level::Representation => &mut self.representation,
        }
    }

    fn levels(&self) -> [&LevelState; 4] {
        [&self.mpd, &self.period, &self.adaptation_set, &self.representation]
    }

    // The levels from the top of the hierarchy down to `level`.
    fn levels_down_to(&self, level: Level) -> Vec<&LevelState> {
        let depth = match level {
            Level::Mpd => 1,
            Level::Period => 2,
            Level::AdaptationSet => 3,
            Level::Representation => 4,
        };
        self.levels().into_iter().take(depth).collect()
    }

    /// Entering an MPD, Period, AdaptationSet or Representation element: its level and the
    /// levels below it start out empty, and the base URLs are saved to be restored when the
    /// element ends.
    pub(crate) fn enter(&mut self, level: Level, attributes: TypedAttributes) {
        self.base_url_snapshots.push(self.base_urls.clone());
        let levels: &[Level] = match level {
            Level::Mpd => &[Level::Mpd, Level::Period, Level::AdaptationSet, Level::Representation],
            Level::Period => &[Level::Period, Level::AdaptationSet, Level::Representation],
            Level::AdaptationSet => &[Level::AdaptationSet, Level::Representation],
            Level::Representation => &[Level::Representation],
        };
        for l in levels {
            *self.level_mut(*l) = LevelState::default();
        }
        self.level_mut(level).attributes = attributes;
    }

    pub(crate) fn leave(&mut self) {
        if let Some(saved) = self.base_url_snapshots.pop() {
            self.base_urls = saved;
        }
    }

    pub(crate) fn add_base_url(&mut self, uri: &str, attributes: TypedAttributes, parent_key: &str) {
        self.base_urls = apply_base_url(&self.base_urls, uri, attributes, parent_key);
    }

    /// Effective attributes of the current Representation: MPD ⊕ Period ⊕ AdaptationSet ⊕
    /// Representation, right-biased.
    pub(crate) fn effective_attributes(&self) -> TypedAttributes {
        self.levels().iter()
            .fold(TypedAttributes::new(), |acc, l| merge_attributes(&acc, &l.attributes))
    }

    /// The addressing that applies to the current Representation. The deepest level that has
    /// any addressing element decides its kind; elements of that kind at higher levels supply
    /// default values.
    pub(crate) fn effective_addressing(&self) -> Option<AddressingState> {
        let kind = self.levels().iter().rev().find_map(|l| l.addressing_kind())?;
        self.merged_addressing(kind, Level::Representation, None)
    }

    /// Merge the addressing elements of `kind` from the top level down to `level`, ending with
    /// `own` if given (an element that is not yet attached to a level).
    pub(crate) fn merged_addressing(
        &self,
        kind: AddressingKind,
        level: Level,
        own: Option<&AddressingState>) -> Option<AddressingState>
    {
        self.levels_down_to(level).into_iter()
            .filter_map(|l| l.addressing(kind))
            .chain(own)
            .fold(None, |acc: Option<AddressingState>, s| match acc {
                Some(parent) => Some(parent.inherit(s)),
                None => Some(s.clone()),
            })
    }

    pub(crate) fn content_protections(&self) -> Vec<ContentProtection> {
        self.levels().iter().flat_map(|l| l.content_protections.iter().cloned()).collect()
    }

    pub(crate) fn descriptors(&self) -> Vec<Descriptor> {
        self.levels().iter().flat_map(|l| l.descriptors.iter().cloned()).collect()
    }

    pub(crate) fn label(&self) -> Option<String> {
        self.levels().iter().rev().find_map(|l| l.label.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn uris(entries: &[BaseUrlEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.uri.as_str()).collect()
    }

    #[test]
    fn test_join_uri_keeps_query() {
        assert_eq!(join_uri("https://example.com/manifest.mpd?auth=secret", "/video42.mp4"),
                   "https://example.com/video42.mp4?auth=secret");
        assert_eq!(join_uri("https://example.com/manifest.mpd?auth=old", "/video42.mp4?auth=new"),
                   "https://example.com/video42.mp4?auth=new");
        assert_eq!(join_uri("video/", "seg1.m4s"), "video/seg1.m4s");
        assert_eq!(join_uri("https://a.com/x/", "https://b.com/y"), "https://b.com/y");
    }

    #[test]
    fn test_same_parent_is_not_cross_resolved() {
        let state = apply_base_url(&[], "https://cdn1.example.com/", TypedAttributes::new(), "MPD");
        let state = apply_base_url(&state, "backup/", TypedAttributes::new(), "MPD");
        assert_eq!(uris(&state), vec!["https://cdn1.example.com/", "backup/"]);
    }

    #[test]
    fn test_relative_resolves_against_other_parents() {
        let state = apply_base_url(&[], "https://cdn1.example.com/", TypedAttributes::new(), "MPD");
        let state = apply_base_url(&state, "https://cdn2.example.com/", TypedAttributes::new(), "MPD");
        let state = apply_base_url(&state, "period1/", TypedAttributes::new(), "Period");
        assert_eq!(uris(&state), vec!["https://cdn1.example.com/period1/", "https://cdn2.example.com/period1/"]);
    }

    #[test]
    fn test_absolute_appended_to_seed() {
        let state = ResolutionState::new(Some("https://example.com/live/manifest.mpd"));
        let out = apply_base_url(&state.base_urls, "https://cdn.example.com/", TypedAttributes::new(), "MPD");
        assert_eq!(uris(&out), vec!["https://example.com/live/manifest.mpd", "https://cdn.example.com/"]);
        let out = apply_base_url(&state.base_urls, "media/", TypedAttributes::new(), "MPD");
        assert_eq!(uris(&out), vec!["https://example.com/live/media/"]);
    }

    #[test]
    fn test_enter_and_leave_restore_base_urls() {
        let mut state = ResolutionState::new(None);
        state.enter(Level::Mpd, TypedAttributes::new());
        state.add_base_url("https://cdn.example.com/", TypedAttributes::new(), "MPD");
        state.enter(Level::Period, TypedAttributes::new());
        state.add_base_url("p1/", TypedAttributes::new(), "Period");
        assert_eq!(uris(&state.base_urls), vec!["https://cdn.example.com/p1/"]);
        state.leave();
        assert_eq!(uris(&state.base_urls), vec!["https://cdn.example.com/"]);
    }
}
