// Substitution of SegmentTemplate identifiers.
//
// From https://dashif.org/docs/DASH-IF-IOP-v4.3.pdf:
// "For the avoidance of doubt, only %0[width]d is permitted and no other identifiers."
//
// Example template: "$RepresentationID$/$Number%06d$.m4s". "$$" is an escaped '$'.

use lazy_static::lazy_static;
use regex::{Captures, Regex, Replacer};


lazy_static! {
    static ref TEMPLATE_IDENTIFIER: Regex =
        Regex::new(r"\$(RepresentationID|Number|Time|Bandwidth)?(?:%0(\d+)d)?\$").unwrap();
}

/// Values for the identifiers of one segment.
#[derive(Debug, Clone, Default)]
pub(crate) struct TemplateValues<'a> {
    pub representation_id: &'a str,
    pub bandwidth: u64,
    pub number: Option<u64>,
    pub time: Option<u64>,
}

impl TemplateValues<'_> {
    fn lookup(&self, identifier: &str) -> Option<String> {
        match identifier {
            "RepresentationID" => Some(self.representation_id.to_string()),
            "Bandwidth" => Some(self.bandwidth.to_string()),
            "Number" => self.number.map(|n| n.to_string()),
            "Time" => self.time.map(|t| t.to_string()),
            _ => None,
        }
    }
}

struct TemplateReplacer<'a, 'b>(&'a TemplateValues<'b>);

impl Replacer for TemplateReplacer<'_, '_> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut String) {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let Some(identifier) = caps.get(1) else {
            if caps.get(2).is_none() {
                dst.push('$');
            } else {
                dst.push_str(whole);
            }
            return;
        };
        // identifiers without a value are left untouched
        let Some(value) = self.0.lookup(identifier.as_str()) else {
            dst.push_str(whole);
            return;
        };
        match caps.get(2).and_then(|w| w.as_str().parse::<usize>().ok()) {
            Some(width) => dst.push_str(&format!("{value:0>width$}")),
            None => dst.push_str(&value),
        }
    }
}

pub(crate) fn resolve_template(template: &str, values: &TemplateValues) -> String {
    TEMPLATE_IDENTIFIER
        .replace_all(template, TemplateReplacer(values))
        .into_owned()
}
