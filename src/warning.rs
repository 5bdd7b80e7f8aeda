//! Recoverable problems found while parsing a manifest.

use thiserror::Error;


/// A problem that caused part of a manifest to be skipped. Parsing always continues after a
/// warning; the offending tag (and, for DASH, its subtree) is dropped, and nothing from it is
/// partially applied to the output document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    #[error("missingRequiredAttribute: {tag} is missing required attribute {attribute}")]
    MissingRequiredAttribute { tag: String, attribute: String },
    #[error("invalidAttributeValue: {tag}@{attribute}={value:?} ({reason})")]
    InvalidAttributeValue { tag: String, attribute: String, value: String, reason: String },
    #[error("invalidTagValue: {tag} {} ({reason})", describe_value(.value))]
    InvalidTagValue { tag: String, value: Option<String>, reason: String },
    #[error("unsupportedTag: {tag}{}", describe_suggestion(.suggestion))]
    UnsupportedTag { tag: String, suggestion: Option<String> },
    #[error("ignoredTag: {tag}")]
    IgnoredTag { tag: String },
    /// A tag that was waiting for child tags was dropped before it could be finalized.
    #[error("pendingDiscarded: {tag} dropped, {reason}")]
    PendingDiscarded { tag: String, reason: String },
    /// An HLS URI line that does not follow an `EXTINF` or `EXT-X-STREAM-INF` tag.
    #[error("orphanUri: {uri} does not follow a segment or variant tag")]
    OrphanUri { uri: String },
    #[error("malformedInput: {reason}")]
    MalformedInput { reason: String },
}

fn describe_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("has value {v:?}"),
        None => String::from("has no value"),
    }
}

fn describe_suggestion(suggestion: &Option<String>) -> String {
    suggestion.as_ref()
        .map(|s| format!(" (did you mean {s:?}?)"))
        .unwrap_or_default()
}

impl ParseWarning {
    /// A stable identifier for the kind of warning.
    pub fn code(&self) -> &'static str {
        match self {
            ParseWarning::MissingRequiredAttribute { .. } => "missingRequiredAttribute",
            ParseWarning::InvalidAttributeValue { .. } => "invalidAttributeValue",
            ParseWarning::InvalidTagValue { .. } => "invalidTagValue",
            ParseWarning::UnsupportedTag { .. } => "unsupportedTag",
            ParseWarning::IgnoredTag { .. } => "ignoredTag",
            ParseWarning::PendingDiscarded { .. } => "pendingDiscarded",
            ParseWarning::OrphanUri { .. } => "orphanUri",
            ParseWarning::MalformedInput { .. } => "malformedInput",
        }
    }
}
