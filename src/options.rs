//! Configuration of a parse session.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::scanner::{Attributes, TagEvent};
use crate::warning::ParseWarning;


/// Free-form values stored by custom tag handlers, returned as the `custom` field of the parsed
/// document.
pub type CustomBag = BTreeMap<String, serde_json::Value>;

pub type WarnCallback = Arc<dyn Fn(&ParseWarning) + Send + Sync>;
pub type DebugCallback = Arc<dyn Fn(&str) + Send + Sync>;
/// Called with the tag, its parent tag (the enclosing element for DASH, the segment or variant
/// tag still waiting for its URI for HLS) and the document's custom bag.
pub type CustomTagHandler = Arc<dyn Fn(&TagEvent, Option<&TagEvent>, &mut CustomBag) + Send + Sync>;
pub type TagValueTransform = Arc<dyn Fn(&str, Option<&str>) -> Option<String> + Send + Sync>;
pub type TagAttributesTransform = Arc<dyn Fn(&str, Attributes) -> Attributes + Send + Sync>;


/// Options for a DASH or HLS parser, following the builder pattern.
///
/// Example
/// ```rust
/// use stream_manifest::ParserOptions;
///
/// let options = ParserOptions::new()
///     .with_uri("https://cdn.example.com/live/manifest.mpd")
///     .ignore_tag("EventStream")
///     .with_warn_callback(|w| eprintln!("manifest warning: {w}"));
/// ```
#[derive(Clone, Default)]
pub struct ParserOptions {
    warn_callback: Option<WarnCallback>,
    debug_callback: Option<DebugCallback>,
    custom_tags: HashMap<String, CustomTagHandler>,
    ignore_tags: HashSet<String>,
    transform_tag_value: Option<TagValueTransform>,
    transform_tag_attributes: Option<TagAttributesTransform>,
    uri: Option<String>,
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut custom: Vec<&String> = self.custom_tags.keys().collect();
        custom.sort();
        f.debug_struct("ParserOptions")
            .field("warn_callback", &self.warn_callback.is_some())
            .field("debug_callback", &self.debug_callback.is_some())
            .field("custom_tags", &custom)
            .field("ignore_tags", &self.ignore_tags)
            .field("transform_tag_value", &self.transform_tag_value.is_some())
            .field("transform_tag_attributes", &self.transform_tag_attributes.is_some())
            .field("uri", &self.uri)
            .finish()
    }
}

impl ParserOptions {
    pub fn new() -> ParserOptions {
        ParserOptions::default()
    }

    /// Receive each recoverable problem found in the manifest. Warnings are also logged with
    /// `tracing::warn!`.
    pub fn with_warn_callback<F>(mut self, f: F) -> ParserOptions
    where F: Fn(&ParseWarning) + Send + Sync + 'static {
        self.warn_callback = Some(Arc::new(f));
        self
    }

    pub fn with_debug_callback<F>(mut self, f: F) -> ParserOptions
    where F: Fn(&str) + Send + Sync + 'static {
        self.debug_callback = Some(Arc::new(f));
        self
    }

    /// Register a handler for a tag that the parser doesn't know about. Handlers are not called for
    /// tags that the parser handles itself.
    pub fn add_custom_tag<F>(mut self, key: &str, f: F) -> ParserOptions
    where F: Fn(&TagEvent, Option<&TagEvent>, &mut CustomBag) + Send + Sync + 'static {
        self.custom_tags.insert(key.to_string(), Arc::new(f));
        self
    }

    /// Skip this tag (for DASH, the element and its subtree), reporting an `ignoredTag` warning.
    pub fn ignore_tag(mut self, key: &str) -> ParserOptions {
        self.ignore_tags.insert(key.to_string());
        self
    }

    /// Rewrite the value of each tag before it is processed. Returning `None` removes the value.
    pub fn with_tag_value_transform<F>(mut self, f: F) -> ParserOptions
    where F: Fn(&str, Option<&str>) -> Option<String> + Send + Sync + 'static {
        self.transform_tag_value = Some(Arc::new(f));
        self
    }

    /// Rewrite the attributes of each tag before they are validated and coerced.
    pub fn with_tag_attributes_transform<F>(mut self, f: F) -> ParserOptions
    where F: Fn(&str, Attributes) -> Attributes + Send + Sync + 'static {
        self.transform_tag_attributes = Some(Arc::new(f));
        self
    }

    /// The URL the manifest was retrieved from. For DASH it seeds the list of active base URLs;
    /// for HLS it is used to compute the resolved URI of segments and variants.
    pub fn with_uri(mut self, uri: &str) -> ParserOptions {
        self.uri = Some(uri.to_string());
        self
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub(crate) fn warn(&self, warning: ParseWarning) {
        warn!("{warning}");
        if let Some(cb) = &self.warn_callback {
            cb(&warning);
        }
    }

    pub(crate) fn debug(&self, message: &str) {
        debug!("{message}");
        if let Some(cb) = &self.debug_callback {
            cb(message);
        }
    }

    pub(crate) fn is_ignored(&self, key: &str) -> bool {
        self.ignore_tags.contains(key)
    }

    pub(crate) fn custom_tag(&self, key: &str) -> Option<&CustomTagHandler> {
        self.custom_tags.get(key)
    }

    pub(crate) fn transform(&self, mut event: TagEvent) -> TagEvent {
        if let Some(tv) = &self.transform_tag_value {
            event.value = tv(&event.key, event.value.as_deref());
        }
        if let Some(ta) = &self.transform_tag_attributes {
            let attributes = std::mem::take(&mut event.attributes);
            event.attributes = ta(&event.key, attributes);
        }
        event
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_transforms() {
        let options = ParserOptions::new()
            .with_tag_value_transform(|key, value| {
                if key == "BaseURL" {
                    value.map(|v| v.replace("http:", "https:"))
                } else {
                    value.map(String::from)
                }
            })
            .with_tag_attributes_transform(|_key, mut attrs| {
                attrs.shift_remove("junk");
                attrs
            });
        let mut event = TagEvent::new("BaseURL");
        event.value = Some(String::from("http://example.com/"));
        event.attributes.insert(String::from("junk"), String::from("1"));
        event.attributes.insert(String::from("serviceLocation"), String::from("a"));
        let out = options.transform(event);
        assert_eq!(out.value.as_deref(), Some("https://example.com/"));
        assert!(out.attribute("junk").is_none());
        assert_eq!(out.attribute("serviceLocation"), Some("a"));
    }

    #[test]
    fn test_callbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = ParserOptions::new()
            .with_warn_callback(move |w| sink.lock().unwrap().push(w.code()))
            .ignore_tag("EXT-X-GAP");
        options.warn(ParseWarning::IgnoredTag { tag: String::from("EXT-X-GAP") });
        assert!(options.is_ignored("EXT-X-GAP"));
        assert_eq!(*seen.lock().unwrap(), vec!["ignoredTag"]);
        let dbg = format!("{options:?}");
        assert!(dbg.contains("EXT-X-GAP"));
    }
}
