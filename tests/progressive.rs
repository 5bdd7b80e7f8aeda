// Tests for the progressive parsing discipline: feeding a manifest in chunks of any size gives the
// same result as parsing it in one call, and the session lifecycle around done() and reset().

pub mod common;
use proptest::prelude::*;
use pretty_assertions::assert_eq;
use stream_manifest::{DashParser, HlsParser, ManifestError, ParsedManifest, ParsedPlaylist, ParserOptions, ProgressiveParser};
use common::WarningCollector;


const MPD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generated by a packager -->
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:cenc="urn:mpeg:cenc:2013" type="static" mediaPresentationDuration="PT12S" minBufferTime="PT1.5S">
  <ProgramInformation><Title>Café &amp; Croissants</Title><Copyright><![CDATA[<c> 2024]]></Copyright></ProgramInformation>
  <BaseURL>https://cdn.example.com/vod/</BaseURL>
  <Period id="p0">
    <AdaptationSet mimeType="video/mp4" codecs="avc1.64001f">
      <ContentProtection schemeIdUri="urn:mpeg:dash:mp4protection:2011" value="cenc"/>
      <SegmentTemplate timescale="1000" media="$RepresentationID$/$Number%05d$.m4s" initialization="$RepresentationID$/init.mp4">
        <SegmentTimeline><S t="0" d="4000" r="2"/></SegmentTimeline>
      </SegmentTemplate>
      <Representation id="v1080" bandwidth="5000000" width="1920" height="1080"/>
      <Representation id="v720" bandwidth="2500000" width="1280" height="720">
        <SupplementalProperty schemeIdUri="urn:example:note" value="ünïcödé"/>
      </Representation>
    </AdaptationSet>
    <AdaptationSet contentType="audio" lang="fr">
      <UnknownElement attr="1"><Child/></UnknownElement>
      <Representation id="a" bandwidth="128000">
        <BaseURL>audio/</BaseURL>
        <SegmentList duration="6"><SegmentURL media="a1.m4s"/><SegmentURL media="a2.m4s" mediaRange="100-199"/></SegmentList>
      </Representation>
    </AdaptationSet>
  </Period>
</MPD>
"#;

const M3U8: &str = "#EXTM3U
#EXT-X-VERSION:7
#EXT-X-TARGETDURATION:6
#EXT-X-MEDIA-SEQUENCE:7
#EXT-X-DEFINE:NAME=\"v\",VALUE=\"v1\"
#EXT-X-KEY:METHOD=SAMPLE-AES,URI=\"skd://key,with,commas\",KEYFORMAT=\"com.apple.streamingkeydelivery\"
#EXT-X-MAP:URI=\"{$v}/init.mp4\"
#EXTINF:6.0,Première partie
{$v}/seg7.m4s
#EXT-X-DISCONTINUITY
#EXT-X-BYTERANGE:1000@0
#EXTINF:5.5,
{$v}/seg8.m4s
#EXT-X-UNKNOWN-TAG:X=1
#EXT-X-PART:DURATION=1.0,URI=\"part9.0.m4s\"
#EXT-X-ENDLIST
";

fn char_chunks<'a>(text: &'a str, cuts: &[usize]) -> Vec<&'a str> {
    let boundaries: Vec<usize> = text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let mut points: Vec<usize> = cuts.iter().map(|c| boundaries[c % boundaries.len()]).collect();
    points.sort_unstable();
    points.dedup();
    let mut chunks = Vec::new();
    let mut previous = 0;
    for p in points {
        chunks.push(&text[previous..p]);
        previous = p;
    }
    chunks.push(&text[previous..]);
    chunks
}

fn byte_chunks<'a>(bytes: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();
    let mut chunks = Vec::new();
    let mut previous = 0;
    for p in points {
        chunks.push(&bytes[previous..p]);
        previous = p;
    }
    chunks.push(&bytes[previous..]);
    chunks
}

fn parse_dash_whole() -> (ParsedManifest, Vec<&'static str>) {
    let warnings = WarningCollector::new();
    let mpd = DashParser::new(warnings.options()).parse(MPD);
    (mpd, warnings.codes())
}

fn parse_hls_whole() -> (ParsedPlaylist, Vec<&'static str>) {
    let warnings = WarningCollector::new();
    let playlist = HlsParser::new(warnings.options()).parse(M3U8);
    (playlist, warnings.codes())
}


#[test_log::test]
fn test_reference_documents() {
    let (mpd, codes) = parse_dash_whole();
    assert_eq!(codes, vec!["unsupportedTag"]);
    assert_eq!(mpd.representations.len(), 3);
    assert_eq!(mpd.representations[0].segments.len(), 3);
    assert_eq!(mpd.representations[1].segments[2].resolved_uri.as_deref(),
               Some("https://cdn.example.com/vod/v720/00003.m4s"));
    assert_eq!(mpd.program_information[0].title.as_deref(), Some("Café & Croissants"));
    assert_eq!(mpd.program_information[0].copyright.as_deref(), Some("<c> 2024"));
    assert_eq!(mpd.representations[2].segments[1].resolved_uri.as_deref(),
               Some("https://cdn.example.com/vod/audio/a2.m4s"));

    let (playlist, codes) = parse_hls_whole();
    assert_eq!(codes, vec!["unsupportedTag"]);
    assert_eq!(playlist.segments.len(), 2);
    assert_eq!(playlist.segments[0].title.as_deref(), Some("Première partie"));
    assert_eq!(playlist.segments[1].uri, "v1/seg8.m4s");
    assert_eq!(playlist.segments[1].number, 8);
    assert_eq!(playlist.segments[0].key.as_ref().and_then(|k| k.uri.as_deref()), Some("skd://key,with,commas"));
    assert_eq!(playlist.partial_segments.len(), 1);
}

proptest! {
    #[test]
    fn dash_chunking_is_invisible(cuts in proptest::collection::vec(any::<usize>(), 0..16)) {
        let (expected, expected_codes) = parse_dash_whole();
        let warnings = WarningCollector::new();
        let mut parser = DashParser::new(warnings.options());
        for chunk in char_chunks(MPD, &cuts) {
            parser.push(chunk).unwrap();
        }
        prop_assert_eq!(parser.done(), expected);
        prop_assert_eq!(warnings.codes(), expected_codes);
    }

    #[test]
    fn dash_byte_chunking_is_invisible(cuts in proptest::collection::vec(any::<usize>(), 0..16)) {
        let (expected, _) = parse_dash_whole();
        let mut parser = DashParser::new(ParserOptions::new());
        for chunk in byte_chunks(MPD.as_bytes(), &cuts) {
            parser.push_bytes(chunk).unwrap();
        }
        prop_assert_eq!(parser.done(), expected);
    }

    #[test]
    fn hls_chunking_is_invisible(cuts in proptest::collection::vec(any::<usize>(), 0..16)) {
        let (expected, expected_codes) = parse_hls_whole();
        let warnings = WarningCollector::new();
        let mut parser = HlsParser::new(warnings.options());
        for chunk in char_chunks(M3U8, &cuts) {
            parser.push(chunk).unwrap();
        }
        prop_assert_eq!(parser.done(), expected);
        prop_assert_eq!(warnings.codes(), expected_codes);
    }

    #[test]
    fn hls_byte_chunking_is_invisible(cuts in proptest::collection::vec(any::<usize>(), 0..16)) {
        let (expected, _) = parse_hls_whole();
        let mut parser = HlsParser::new(ParserOptions::new());
        for chunk in byte_chunks(M3U8.as_bytes(), &cuts) {
            parser.push_bytes(chunk).unwrap();
        }
        prop_assert_eq!(parser.done(), expected);
    }
}

#[test_log::test]
fn test_one_character_at_a_time() {
    let (expected, _) = parse_dash_whole();
    let mut parser = DashParser::new(ParserOptions::new());
    let mut buf = [0u8; 4];
    for c in MPD.chars() {
        parser.push(c.encode_utf8(&mut buf)).unwrap();
    }
    assert_eq!(parser.done(), expected);
}

#[test_log::test]
fn test_push_after_done() {
    let mut parser = HlsParser::new(ParserOptions::new());
    parser.push("#EXTM3U\n#EXTINF:4,\na.ts\n").unwrap();
    assert_eq!(parser.done().segments.len(), 1);
    assert_eq!(parser.push("#EXTINF:4,\nb.ts\n"), Err(ManifestError::SessionFinished));
    assert_eq!(parser.push_bytes(b"b.ts\n"), Err(ManifestError::SessionFinished));
    // a second done() has nothing left to return
    assert_eq!(parser.done(), ParsedPlaylist::default());
    parser.reset();
    parser.push("#EXTM3U\n#EXTINF:4,\nb.ts\n").unwrap();
    let playlist = parser.done();
    assert_eq!(playlist.segments[0].uri, "b.ts");
    assert_eq!(playlist.segments[0].number, 0);
}

#[test_log::test]
fn test_dash_session_reuse() {
    let mut parser = DashParser::new(ParserOptions::new());
    let first = parser.parse(MPD);
    assert!(matches!(parser.push("<MPD/>"), Err(ManifestError::SessionFinished)));
    assert_eq!(parser.done(), ParsedManifest::default());
    // parse() resets the session itself
    let second = parser.parse(MPD);
    assert_eq!(first, second);
}

#[test_log::test]
fn test_reset_discards_partial_input() {
    let mut parser = DashParser::new(ParserOptions::new());
    parser.push(r#"<MPD><Period><AdaptationSet mimeType="video/mp4"><Representation id="x" band"#).unwrap();
    parser.reset();
    parser.push(r#"<MPD><Period><AdaptationSet mimeType="audio/mp4"><Representation id="a" bandwidth="1"/></AdaptationSet></Period></MPD>"#).unwrap();
    let mpd = parser.done();
    assert_eq!(mpd.representations.len(), 1);
    assert_eq!(mpd.representations[0].id, "a");
}

#[test_log::test]
fn test_byte_order_mark_skipped() {
    let playlist = HlsParser::new(ParserOptions::new()).parse("\u{feff}#EXTM3U\n#EXTINF:4,\na.ts\n");
    assert!(playlist.m3u);
    assert_eq!(playlist.segments.len(), 1);
    let mut parser = DashParser::new(ParserOptions::new());
    parser.push_bytes(b"\xef\xbb").unwrap();
    parser.push_bytes(b"\xbf<MPD mediaPresentationDuration=\"PT2S\"/>").unwrap();
    assert_eq!(parser.done().media_presentation_duration, Some(2.0));
}

#[test_log::test]
fn test_latin1_fallback() {
    let mut parser = HlsParser::new(ParserOptions::new());
    parser.push_bytes(b"#EXTM3U\n#EXTINF:4,Caf\xe9 cr\xe8me\na.ts\n").unwrap();
    let playlist = parser.done();
    assert_eq!(playlist.segments[0].title.as_deref(), Some("Café crème"));
}

#[test_log::test]
fn test_split_multibyte_character() {
    let bytes = "#EXTM3U\n#EXTINF:4,Æsir\na.ts\n".as_bytes();
    let split = bytes.iter().position(|b| *b == 0xc3).unwrap() + 1;
    let mut parser = HlsParser::new(ParserOptions::new());
    parser.push_bytes(&bytes[..split]).unwrap();
    parser.push_bytes(&bytes[split..]).unwrap();
    assert_eq!(parser.done().segments[0].title.as_deref(), Some("Æsir"));
}

#[test_log::test]
fn test_options_survive_done() {
    let warnings = WarningCollector::new();
    let mut parser = HlsParser::new(warnings.options());
    parser.parse("#EXTM3U\n#EXT-X-BOGUS\n");
    parser.parse("#EXTM3U\n#EXT-X-BOGUS\n");
    assert_eq!(warnings.count("unsupportedTag"), 2);
}
