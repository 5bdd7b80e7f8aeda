// Routing of tag events to the per-format tag tables, shared by the DASH and HLS parsers.
//
// For each event: (1) explicitly ignored tags are dropped with a warning; (2) known tags have their
// required attributes checked and their attribute values coerced; (3) tags with a registered
// custom handler are passed to it; (4) anything else is dropped as unsupported.

use std::sync::Arc;
use edit_distance::edit_distance;
use crate::options::{CustomTagHandler, ParserOptions};
use crate::scanner::{Attributes, TagEvent};
use crate::values::{Coercion, TypedAttributes};
use crate::warning::ParseWarning;


/// Attributes that must be present for a tag to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Required {
    Nothing,
    All(&'static [&'static str]),
    /// At least one of these must be present; each is reported when none is.
    AnyOf(&'static [&'static str]),
}

impl Required {
    pub(crate) fn missing(self, attributes: &Attributes) -> Vec<&'static str> {
        match self {
            Required::Nothing => Vec::new(),
            Required::All(names) => names.iter()
                .filter(|n| !attributes.contains_key(**n))
                .copied()
                .collect(),
            Required::AnyOf(names) => {
                if names.iter().any(|n| attributes.contains_key(*n)) {
                    Vec::new()
                } else {
                    names.to_vec()
                }
            },
        }
    }
}

pub(crate) enum Route<K> {
    Ignored,
    Known(K),
    Custom(CustomTagHandler),
    Unsupported,
}

pub(crate) fn route<K>(
    key: &str,
    known: Option<K>,
    known_keys: &[&str],
    options: &ParserOptions) -> Route<K>
{
    if options.is_ignored(key) {
        options.warn(ParseWarning::IgnoredTag { tag: key.to_string() });
        return Route::Ignored;
    }
    if let Some(k) = known {
        return Route::Known(k);
    }
    if let Some(handler) = options.custom_tag(key) {
        return Route::Custom(Arc::clone(handler));
    }
    options.warn(ParseWarning::UnsupportedTag {
        tag: key.to_string(),
        suggestion: closest_key(key, known_keys).map(String::from),
    });
    Route::Unsupported
}

// Suggest a known tag for a probable typo.
fn closest_key<'k>(key: &str, known_keys: &[&'k str]) -> Option<&'k str> {
    known_keys.iter()
        .map(|k| (edit_distance(key, k), *k))
        .filter(|(d, _)| *d > 0 && *d <= 2)
        .min_by_key(|(d, _)| *d)
        .map(|(_, k)| k)
}

/// Check the required attributes of a known tag and coerce its attribute values. On failure every
/// problem is reported and `None` is returned, so that the tag is skipped without any of it being
/// applied.
pub(crate) fn validate(
    event: &TagEvent,
    required: Required,
    coercion: impl Fn(&str) -> Coercion,
    options: &ParserOptions) -> Option<TypedAttributes>
{
    let missing = required.missing(&event.attributes);
    if !missing.is_empty() {
        for attribute in missing {
            options.warn(ParseWarning::MissingRequiredAttribute {
                tag: event.key.clone(),
                attribute: attribute.to_string(),
            });
        }
        return None;
    }
    let mut typed = TypedAttributes::with_capacity(event.attributes.len());
    for (name, raw) in &event.attributes {
        match coercion(name.as_str()).apply(raw) {
            Ok(v) => {
                typed.insert(name.clone(), v);
            },
            Err(e) => {
                options.warn(ParseWarning::InvalidAttributeValue {
                    tag: event.key.clone(),
                    attribute: name.clone(),
                    value: raw.clone(),
                    reason: e.to_string(),
                });
                return None;
            },
        }
    }
    Some(typed)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting_options() -> (ParserOptions, Arc<Mutex<Vec<ParseWarning>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = ParserOptions::new()
            .with_warn_callback(move |w| sink.lock().unwrap().push(w.clone()));
        (options, seen)
    }

    #[test]
    fn test_required_any_of() {
        let mut attrs = Attributes::new();
        attrs.insert("subsegmentAlignment".into(), "true".into());
        let req = Required::AnyOf(&["mimeType", "contentType"]);
        assert_eq!(req.missing(&attrs), vec!["mimeType", "contentType"]);
        attrs.insert("contentType".into(), "audio".into());
        assert!(req.missing(&attrs).is_empty());
        assert_eq!(Required::All(&["id", "bandwidth"]).missing(&attrs), vec!["id", "bandwidth"]);
    }

    #[test]
    fn test_route_unsupported_suggestion() {
        let (options, seen) = collecting_options();
        let r: Route<()> = route("Representaton", None, &["Representation", "Period"], &options);
        assert!(matches!(r, Route::Unsupported));
        let warnings = seen.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0], ParseWarning::UnsupportedTag {
            tag: "Representaton".into(),
            suggestion: Some("Representation".into()),
        });
    }

    #[test]
    fn test_validate_rejects_bad_value() {
        let (options, seen) = collecting_options();
        let mut event = TagEvent::new("S");
        event.attributes.insert("d".into(), "ten".into());
        let out = validate(&event, Required::All(&["d"]), |_| Coercion::Int, &options);
        assert!(out.is_none());
        assert_eq!(seen.lock().unwrap()[0].code(), "invalidAttributeValue");
    }
}
