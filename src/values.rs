//! Parsers for the primitive attribute values found in DASH and HLS manifests.
//
// These are pure functions. The `Coercion` table entries used by each format's tag table map an
// attribute name to one of these parsers.

use std::fmt;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use crate::ManifestError;


lazy_static! {
    static ref XS_DURATION: Regex = Regex::new(concat!(r"^(?P<sign>[+-])?P",
                                                       r"(?:(?P<years>\d+)Y)?",
                                                       r"(?:(?P<months>\d+)M)?",
                                                       r"(?:(?P<weeks>\d+)W)?",
                                                       r"(?:(?P<days>\d+)D)?",
                                                       r"(?:(?P<hastime>T)", // time part must begin with a T
                                                       r"(?:(?P<hours>\d+)H)?",
                                                       r"(?:(?P<minutes>\d+)M)?",
                                                       r"(?:(?P<seconds>\d+(?:[.,]\d+)?)S)?",
                                                       r")?$")).unwrap();
    static ref TIMEZONE_SUFFIX: Regex = Regex::new(r"(?:[Zz]|[+-]\d{2}(?::?\d{2})?)$").unwrap();
}


// Parse an ISO 8601 duration string, as used by the xs:duration type in DASH manifests, returning
// a number of seconds.
//
// The lexical representation is PnYnMnDTnHnMnS, where nY represents the number of years, nM the
// number of months, nD the number of days, 'T' is the date/time separator, nH the number of hours,
// nM the number of minutes and nS the number of seconds. The number of seconds can include decimal
// digits.
//
// Examples: "PT0H0M30.030S", "PT1.2S", PT1004199059S, PT130S, P1DT2H, P0Y20M0D
//
// Years and months are converted using a fixed 365-day year and a fixed 30-day month, since a
// duration in a manifest is not anchored to a calendar date.
pub fn parse_duration(s: &str) -> Result<f64, ManifestError> {
    let m = XS_DURATION.captures(s.trim())
        .ok_or_else(|| ManifestError::InvalidDuration(format!("couldn't parse {s:?}")))?;
    if m.name("years").is_none() &&
        m.name("months").is_none() &&
        m.name("weeks").is_none() &&
        m.name("days").is_none() &&
        m.name("hours").is_none() &&
        m.name("minutes").is_none() &&
        m.name("seconds").is_none() {
            return Err(ManifestError::InvalidDuration(format!("empty duration {s:?}")));
        }
    let component = |name: &str, unit: f64| -> Result<f64, ManifestError> {
        match m.name(name) {
            Some(v) => v.as_str().replace(',', ".").parse::<f64>()
                .map(|n| n * unit)
                .map_err(|_| ManifestError::InvalidDuration(format!("invalid {name} in {s:?}"))),
            None => Ok(0.0),
        }
    };
    let mut secs = component("years", 31_536_000.0)?;
    secs += component("months", 2_592_000.0)?;
    secs += component("weeks", 604_800.0)?;
    secs += component("days", 86_400.0)?;
    secs += component("hours", 3_600.0)?;
    secs += component("minutes", 60.0)?;
    secs += component("seconds", 1.0)?;
    if m.name("sign").is_some_and(|sign| sign.as_str() == "-") {
        secs = -secs;
    }
    Ok(secs)
}

/// Parse an xs:dateTime (DASH) or ISO 8601 date (HLS EXT-X-PROGRAM-DATE-TIME). Dates without an
/// explicit timezone are interpreted as UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, ManifestError> {
    let s = s.trim();
    if !s.contains('T') {
        // A plain date such as "2021-06-03".
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| ManifestError::InvalidDate(format!("{s:?}: {e}")))?;
        return date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ManifestError::InvalidDate(s.to_string()));
    }
    let with_zone = if TIMEZONE_SUFFIX.is_match(s.split_once('T').map_or("", |(_, time)| time)) {
        s.to_string()
    } else {
        format!("{s}Z")
    };
    DateTime::parse_from_rfc3339(&with_zone)
        .or_else(|_| DateTime::parse_from_str(&with_zone, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ManifestError::InvalidDate(format!("{s:?}: {e}")))
}

/// Parse a frame rate or other rational number, which can be written as "25" or "30000/1001".
pub fn parse_fraction(s: &str) -> Result<f64, ManifestError> {
    let invalid = || ManifestError::InvalidNumber(format!("invalid fraction {s:?}"));
    match s.trim().split_once('/') {
        Some((num, den)) => {
            let numerator: f64 = num.trim().parse().map_err(|_| invalid())?;
            let denominator: f64 = den.trim().parse().map_err(|_| invalid())?;
            if denominator == 0.0 {
                return Err(invalid());
            }
            Ok(numerator / denominator)
        },
        None => parse_float(s),
    }
}

/// Accepts the xs:boolean lexical forms used by DASH and the YES/NO enumerated strings of HLS.
pub fn parse_bool(s: &str) -> Result<bool, ManifestError> {
    match s.trim() {
        "true" | "1" | "YES" => Ok(true),
        "false" | "0" | "NO" => Ok(false),
        other => Err(ManifestError::Parsing(format!("invalid boolean {other:?}"))),
    }
}

pub fn parse_int(s: &str) -> Result<i64, ManifestError> {
    s.trim().parse::<i64>()
        .map_err(|_| ManifestError::InvalidNumber(format!("invalid integer {s:?}")))
}

pub fn parse_float(s: &str) -> Result<f64, ManifestError> {
    let f = s.trim().parse::<f64>()
        .map_err(|_| ManifestError::InvalidNumber(format!("invalid number {s:?}")))?;
    if f.is_finite() {
        Ok(f)
    } else {
        Err(ManifestError::InvalidNumber(format!("non-finite number {s:?}")))
    }
}

/// A contiguous range of bytes, both offsets inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub from: u64,
    pub to: u64,
}

impl ByteRange {
    pub fn length(&self) -> u64 {
        self.to - self.from + 1
    }
}

// Parse a DASH range specifier, such as Initialization@range or SegmentBase@indexRange attributes,
// of the form "45-67".
pub fn parse_byte_range(range: &str) -> Result<ByteRange, ManifestError> {
    let (start, end) = range.trim().split_once('-')
        .ok_or_else(|| ManifestError::Parsing(format!("invalid range specifier: {range}")))?;
    let from: u64 = start.parse()
        .map_err(|_| ManifestError::Parsing(format!("invalid start for range specifier {range}")))?;
    let to: u64 = end.parse()
        .map_err(|_| ManifestError::Parsing(format!("invalid end for range specifier {range}")))?;
    if to < from {
        return Err(ManifestError::Parsing(format!("inverted range specifier {range}")));
    }
    Ok(ByteRange { from, to })
}

/// A video resolution, written `1920x1080` in HLS playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u64,
    pub height: u64,
}

pub fn parse_resolution(s: &str) -> Result<Resolution, ManifestError> {
    let invalid = || ManifestError::InvalidNumber(format!("invalid resolution {s:?}"));
    let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    Ok(Resolution {
        width: w.parse().map_err(|_| invalid())?,
        height: h.parse().map_err(|_| invalid())?,
    })
}


/// A coerced attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    /// A duration, converted to seconds.
    Seconds(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Resolution(Resolution),
    Range(ByteRange),
    Str(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            AttrValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|i| u64::try_from(i).ok())
    }

    /// Numeric value as a float. Durations are returned in seconds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) | AttrValue::Seconds(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttrValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<ByteRange> {
        match self {
            AttrValue::Range(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_resolution(&self) -> Option<Resolution> {
        match self {
            AttrValue::Resolution(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Seconds(v) => write!(f, "{v}s"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            AttrValue::Resolution(r) => write!(f, "{}x{}", r.width, r.height),
            AttrValue::Range(r) => write!(f, "{}-{}", r.from, r.to),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

/// Attributes of one tag after coercion, in document order.
pub type TypedAttributes = IndexMap<String, AttrValue>;

/// Right-biased merge: entries in `over` replace same-named entries in `base`.
pub fn merge_attributes(base: &TypedAttributes, over: &TypedAttributes) -> TypedAttributes {
    let mut merged = base.clone();
    for (k, v) in over {
        merged.insert(k.clone(), v.clone());
    }
    merged
}


/// How the raw string value of an attribute is converted to an [`AttrValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Identity,
    Int,
    Float,
    Bool,
    /// An ISO 8601 duration, converted to seconds.
    Duration,
    /// An integer (or decimal) count of timescale units, falling back to an ISO 8601 duration
    /// string (converted to seconds) for manifests that write it that way.
    TimescaleDuration,
    Date,
    Fraction,
    Resolution,
    ByteRange,
}

impl Coercion {
    pub fn apply(self, raw: &str) -> Result<AttrValue, ManifestError> {
        match self {
            Coercion::Identity => Ok(AttrValue::Str(raw.to_string())),
            Coercion::Int => parse_int(raw).map(AttrValue::Int),
            Coercion::Float => parse_float(raw).map(AttrValue::Float),
            Coercion::Bool => parse_bool(raw).map(AttrValue::Bool),
            Coercion::Duration => parse_duration(raw).map(AttrValue::Seconds),
            Coercion::TimescaleDuration => {
                if let Ok(i) = parse_int(raw) {
                    Ok(AttrValue::Int(i))
                } else if let Ok(f) = parse_float(raw) {
                    Ok(AttrValue::Float(f))
                } else {
                    parse_duration(raw).map(AttrValue::Seconds)
                }
            },
            Coercion::Date => parse_date(raw).map(AttrValue::Date),
            Coercion::Fraction => parse_fraction(raw).map(AttrValue::Float),
            Coercion::Resolution => parse_resolution(raw).map(AttrValue::Resolution),
            Coercion::ByteRange => parse_byte_range(raw).map(AttrValue::Range),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("foobles").is_err());
        assert!(parse_duration("P").is_err());
        assert!(parse_duration("PT").is_err());
        assert!(parse_duration("1Y2M3DT4H5M6S").is_err()); // missing initial P
        assert_eq!(parse_duration("PT1H2M3.5S").ok(), Some(3723.5));
        assert_eq!(parse_duration("P1Y").ok(), Some(31_536_000.0));
        assert_eq!(parse_duration("PT3H11M53S").ok(), Some(11513.0));
        assert_eq!(parse_duration("PT0H10M0.00S").ok(), Some(600.0));
        assert_eq!(parse_duration("PT1.5S").ok(), Some(1.5));
        assert_eq!(parse_duration("PT0S").ok(), Some(0.0));
        assert_eq!(parse_duration("PT344S").ok(), Some(344.0));
        assert_eq!(parse_duration("PT72H").ok(), Some(259_200.0));
        assert_eq!(parse_duration("P0Y20M0D").ok(), Some(51_840_000.0));
        assert_eq!(parse_duration("P26W").ok(), Some(15_724_800.0));
        assert_eq!(parse_duration("+PT4H").ok(), Some(14400.0));
        assert_eq!(parse_duration("-PT4S").ok(), Some(-4.0));
        assert_eq!(parse_duration("P1Y2M3DT4H5M6,5S").ok(), Some(36_993_906.5));
        let d = parse_duration("P10Y10M10DT10H10M10.1S").unwrap();
        let expected = 10.0 * 31_536_000.0 + 10.0 * 2_592_000.0 + 10.0 * 86_400.0
            + 10.0 * 3600.0 + 10.0 * 60.0 + 10.1;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_parse_date() {
        let utc = parse_date("2021-06-03T13:00:00Z").unwrap();
        assert_eq!(utc.timestamp(), 1_622_725_200);
        // no timezone: treated as UTC
        assert_eq!(parse_date("2021-06-03T13:00:00").unwrap(), utc);
        assert_eq!(parse_date("2021-06-03T15:00:00+02:00").unwrap(), utc);
        assert_eq!(parse_date("2021-06-03T15:00:00+0200").unwrap(), utc);
        let frac = parse_date("2010-02-19T14:54:23.031+08:00").unwrap();
        assert_eq!(frac.timestamp_subsec_millis(), 31);
        assert_eq!(parse_date("2021-06-03").unwrap().timestamp(), 1_622_678_400);
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_fraction("30000/1001").ok(), Some(30000.0 / 1001.0));
        assert_eq!(parse_fraction("25").ok(), Some(25.0));
        assert!(parse_fraction("25/0").is_err());
        assert!(parse_fraction("x/2").is_err());
        assert_eq!(parse_bool("true").ok(), Some(true));
        assert_eq!(parse_bool("NO").ok(), Some(false));
        assert!(parse_bool("maybe").is_err());
        assert_eq!(parse_int(" 42 ").ok(), Some(42));
        assert!(parse_int("4.2").is_err());
        assert!(parse_float("NaN").is_err());
        assert_eq!(parse_byte_range("45-67").ok(), Some(ByteRange { from: 45, to: 67 }));
        assert!(parse_byte_range("67-45").is_err());
        assert_eq!(parse_resolution("1920x1080").ok(), Some(Resolution { width: 1920, height: 1080 }));
    }

    #[test]
    fn test_timescale_duration_fallback() {
        assert_eq!(Coercion::TimescaleDuration.apply("90000").ok(), Some(AttrValue::Int(90000)));
        assert_eq!(Coercion::TimescaleDuration.apply("2.5").ok(), Some(AttrValue::Float(2.5)));
        assert_eq!(Coercion::TimescaleDuration.apply("PT2S").ok(), Some(AttrValue::Seconds(2.0)));
        assert!(Coercion::TimescaleDuration.apply("two").is_err());
    }

    #[test]
    fn test_merge_attributes() {
        let mut base = TypedAttributes::new();
        base.insert("bandwidth".into(), AttrValue::Int(1));
        base.insert("mimeType".into(), AttrValue::Str("video/mp4".into()));
        let mut over = TypedAttributes::new();
        over.insert("bandwidth".into(), AttrValue::Int(2));
        let merged = merge_attributes(&base, &over);
        assert_eq!(merged.get("bandwidth"), Some(&AttrValue::Int(2)));
        assert_eq!(merged.get("mimeType").and_then(|v| v.as_str()), Some("video/mp4"));
    }
}
