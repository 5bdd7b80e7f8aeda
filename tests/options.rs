// Tests for parser options: ignored tags, custom tag handlers, value and attribute transforms, and
// the warn and debug callbacks.

pub mod common;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;
use stream_manifest::{dash, hls, ParseWarning, ParserOptions};
use common::WarningCollector;


#[test]
fn test_ignore_tag_skips_subtree() {
    let warnings = WarningCollector::new();
    let options = warnings.attach(ParserOptions::new().ignore_tag("EventStream"));
    let mpd = dash::parse(r#"<MPD><Period>
  <EventStream schemeIdUri="urn:example"><Event id="1" presentationTime="0"/><Bogus/></EventStream>
  <AdaptationSet mimeType="video/mp4"><Representation id="v" bandwidth="1"/></AdaptationSet>
</Period></MPD>"#, &options);
    assert_eq!(warnings.codes(), vec!["ignoredTag"]);
    assert!(mpd.event_streams.is_empty());
    assert_eq!(mpd.representations.len(), 1);
}

#[test]
fn test_ignore_hls_tag() {
    let warnings = WarningCollector::new();
    let options = warnings.attach(ParserOptions::new().ignore_tag("EXT-X-PROGRAM-DATE-TIME"));
    let playlist = hls::parse("#EXTM3U\n#EXT-X-PROGRAM-DATE-TIME:2024-01-01T00:00:00Z\n#EXTINF:4,\na.ts\n", &options);
    assert_eq!(warnings.codes(), vec!["ignoredTag"]);
    assert!(playlist.segments[0].program_date_time.is_none());
}

#[test]
fn test_dash_custom_element_with_parent() {
    let options = ParserOptions::new()
        .add_custom_tag("ServiceDescription", |event, _parent, bag| {
            bag.insert(String::from("serviceDescription"), json!(event.attribute("id")));
        })
        .add_custom_tag("Latency", |event, parent, bag| {
            bag.insert(String::from("latency"), json!({
                "target": event.attribute("target"),
                "parent": parent.map(|p| p.key.clone()),
            }));
        });
    let warnings = WarningCollector::new();
    let mpd = dash::parse(r#"<MPD type="dynamic">
  <ServiceDescription id="0"><Latency target="3000" max="6000"/></ServiceDescription>
  <Period/>
</MPD>"#, &warnings.attach(options));
    assert!(warnings.codes().is_empty());
    assert_eq!(mpd.custom.get("serviceDescription"), Some(&json!("0")));
    assert_eq!(mpd.custom.get("latency"), Some(&json!({"target": "3000", "parent": "ServiceDescription"})));
}

#[test]
fn test_hls_custom_tag_parent_is_pending_segment() {
    let options = ParserOptions::new()
        .add_custom_tag("EXT-X-CUE-OUT", |event, parent, bag| {
            let entry = json!({
                "duration": event.value,
                "parent": parent.map(|p| p.key.clone()),
            });
            let key = format!("cue{}", bag.len());
            bag.insert(key, entry);
        });
    let playlist = hls::parse(r#"#EXTM3U
#EXT-X-CUE-OUT:10
#EXTINF:4,
#EXT-X-CUE-OUT:30
a.ts
"#, &options);
    assert_eq!(playlist.custom.get("cue0"), Some(&json!({"duration": "10", "parent": null})));
    assert_eq!(playlist.custom.get("cue1"), Some(&json!({"duration": "30", "parent": "EXTINF"})));
    assert_eq!(playlist.segments.len(), 1);
}

#[test]
fn test_custom_handler_not_called_for_known_tags() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = ParserOptions::new()
        .add_custom_tag("EXTINF", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let playlist = hls::parse("#EXTM3U\n#EXTINF:4,\na.ts\n", &options);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(playlist.segments.len(), 1);
}

#[test]
fn test_tag_value_transform() {
    let options = ParserOptions::new()
        .with_tag_value_transform(|key, value| match key {
            "BaseURL" => value.map(|v| v.replace("http://", "https://")),
            _ => value.map(String::from),
        });
    let mpd = dash::parse(r#"<MPD><BaseURL>http://cdn.example.com/</BaseURL><Period>
  <AdaptationSet mimeType="video/mp4"><Representation id="v" bandwidth="1"/></AdaptationSet>
</Period></MPD>"#, &options);
    assert_eq!(mpd.representations[0].base_url.as_deref(), Some("https://cdn.example.com/"));
}

#[test]
fn test_hls_value_transform() {
    let options = ParserOptions::new()
        .with_tag_value_transform(|key, value| match key {
            "EXT-X-TARGETDURATION" => Some(String::from("6")),
            _ => value.map(String::from),
        });
    let playlist = hls::parse("#EXTM3U\n#EXT-X-TARGETDURATION:not-a-number\n", &options);
    assert_eq!(playlist.target_duration, Some(6.0));
}

#[test]
fn test_attributes_transform_runs_before_validation() {
    let warnings = WarningCollector::new();
    let options = ParserOptions::new()
        .with_tag_attributes_transform(|key, mut attributes| {
            if key == "AdaptationSet" && !attributes.contains_key("contentType") {
                attributes.insert(String::from("contentType"), String::from("video"));
            }
            attributes
        });
    let mpd = dash::parse(r#"<MPD><Period><AdaptationSet><Representation id="v" bandwidth="1"/></AdaptationSet></Period></MPD>"#,
                          &warnings.attach(options));
    assert!(warnings.codes().is_empty());
    assert_eq!(mpd.representations[0].content_type.as_deref(), Some("video"));
}

#[test]
fn test_debug_callback() {
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&messages);
    let options = ParserOptions::new()
        .with_debug_callback(move |msg| sink.lock().unwrap().push(msg.to_string()));
    dash::parse(r#"<MPD mediaPresentationDuration="PT4S"><Period><AdaptationSet mimeType="video/mp4">
  <SegmentTemplate media="$Time$.m4s"><SegmentTimeline><S d="2" r="1"/></SegmentTimeline></SegmentTemplate>
  <Representation id="v" bandwidth="1"/>
</AdaptationSet></Period></MPD>"#, &options);
    let messages = messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("waiting for SegmentTimeline")));
    assert!(messages.iter().any(|m| m.contains("complete")));
}

#[test]
fn test_unsupported_hls_tag_suggestion() {
    let warnings = WarningCollector::new();
    hls::parse("#EXTM3U\n#EXT-X-TARGETDURATON:10\n", &warnings.options());
    assert_eq!(warnings.warnings(), vec![ParseWarning::UnsupportedTag {
        tag: String::from("EXT-X-TARGETDURATON"),
        suggestion: Some(String::from("EXT-X-TARGETDURATION")),
    }]);
}
