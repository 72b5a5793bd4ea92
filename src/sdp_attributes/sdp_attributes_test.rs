use std::io::Cursor;

use sdp::description::session::SessionDescription;

use super::*;
use crate::rtp_transceiver::{
    TYPE_RTCP_FB_ACK, TYPE_RTCP_FB_CCM, TYPE_RTCP_FB_GOOG_REMB, TYPE_RTCP_FB_NACK,
    TYPE_RTCP_FB_TRANSPORT_CC,
};

fn media_with(kind: &str, formats: &[&str], attributes: &[(&str, &str)]) -> MediaDescription {
    let mut media = MediaDescription::default();
    media.media_name.media = kind.to_owned();
    media.media_name.formats = formats.iter().map(|f| f.to_string()).collect();
    for (key, value) in attributes {
        media = media.with_value_attribute(key.to_string(), value.to_string());
    }
    media
}

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_parse_rtp_map() -> Result<()> {
    let vp8 = parse_rtp_map("96 VP8/90000")?;
    assert_eq!(vp8.payload_type, 96);
    assert_eq!(vp8.name, "VP8");
    assert_eq!(vp8.clock_rate, 90000);
    assert_eq!(vp8.channels, 0);

    let opus = parse_rtp_map("111 opus/48000/2")?;
    assert_eq!(opus.payload_type, 111);
    assert_eq!(opus.name, "opus");
    assert_eq!(opus.clock_rate, 48000);
    assert_eq!(opus.channels, 2);

    Ok(())
}

#[test]
fn test_parse_rtp_map_errors() {
    let tests = vec![
        (
            "bad",
            Error::ErrAttributeTooShort {
                attribute: "rtpmap".to_owned(),
                value: "bad".to_owned(),
            },
        ),
        (
            " VP8/90000",
            Error::ErrAttributeTooShort {
                attribute: "rtpmap".to_owned(),
                value: " VP8/90000".to_owned(),
            },
        ),
        ("x96 VP8/90000", Error::ErrInvalidPayloadType("x96".to_owned())),
        ("300 VP8/90000", Error::ErrInvalidPayloadType("300".to_owned())),
        ("96 VP8", Error::ErrInvalidCodec("VP8".to_owned())),
        ("96 VP8/fast", Error::ErrInvalidClockRate("fast".to_owned())),
        ("111 opus/48000/two", Error::ErrInvalidChannels("two".to_owned())),
    ];

    for (value, expected) in tests {
        assert_eq!(parse_rtp_map(value), Err(expected), "{value}");
    }
}

#[test]
fn test_parse_fmtp() -> Result<()> {
    let tests = vec![
        ("96 vbr=on;cng=on", map(&[("vbr", "on"), ("cng", "on")])),
        ("96 vbr=on; cng=on", map(&[("vbr", "on"), ("cng", "on")])),
        ("96 vbr=on;;cng=on;", map(&[("vbr", "on"), ("cng", "on")])),
        (
            "100 profile-level-id=42e01f;packetization-mode=1",
            map(&[("profile-level-id", "42e01f"), ("packetization-mode", "1")]),
        ),
        ("96 apt=", map(&[("apt", "")])),
    ];

    for (value, expected) in tests {
        assert_eq!(parse_fmtp(value)?, expected, "{value}");
    }

    assert_eq!(
        parse_fmtp("96 vbr=on;novalue"),
        Err(Error::ErrInvalidFmtpParameter("novalue".to_owned()))
    );
    assert!(parse_fmtp("vbr=on").is_err());

    Ok(())
}

#[test]
fn test_parse_fmtp_string_keeps_value_after_first_equal() -> Result<()> {
    let params = parse_fmtp_string("sprop-parameter-sets=Z0LAHtkAoD2==,aMuMsg==")?;
    assert_eq!(
        params.get("sprop-parameter-sets").map(String::as_str),
        Some("Z0LAHtkAoD2==,aMuMsg==")
    );
    assert!(parse_fmtp_string("")?.is_empty());
    Ok(())
}

#[test]
fn test_parse_rtcp_feedback() -> Result<()> {
    let tests = vec![
        ("98 nack rpsi", TYPE_RTCP_FB_NACK, "rpsi"),
        ("96 nack", TYPE_RTCP_FB_NACK, ""),
        ("96 goog-remb", TYPE_RTCP_FB_GOOG_REMB, ""),
        ("96 ccm fir", TYPE_RTCP_FB_CCM, "fir"),
        ("96 transport-cc", TYPE_RTCP_FB_TRANSPORT_CC, ""),
        ("96 ack rpsi", TYPE_RTCP_FB_ACK, "rpsi"),
    ];

    for (value, typ, parameter) in tests {
        let fb = parse_rtcp_feedback(value)?;
        assert_eq!(fb.typ, typ);
        assert_eq!(fb.parameter, parameter);
    }

    assert!(parse_rtcp_feedback("nack").is_err());

    Ok(())
}

#[test]
fn test_parse_extmap() -> Result<()> {
    let ext = parse_extmap("2/sendonly urn:ietf:params:rtp-hdrext:toffset")?;
    assert_eq!(ext.id, 2);
    assert_eq!(ext.direction, RTCRtpTransceiverDirection::Sendonly);
    assert_eq!(ext.uri, "urn:ietf:params:rtp-hdrext:toffset");

    let ext = parse_extmap("2 urn:ietf:params:rtp-hdrext:toffset")?;
    assert_eq!(ext.id, 2);
    assert_eq!(ext.direction, RTCRtpTransceiverDirection::Sendrecv);

    let ext = parse_extmap("65535/recvonly urn:x")?;
    assert_eq!(ext.id, 65535);
    assert_eq!(ext.direction, RTCRtpTransceiverDirection::Recvonly);

    assert_eq!(
        parse_extmap("65536 urn:x"),
        Err(Error::ErrInvalidExtmapId("65536".to_owned()))
    );
    let ext = parse_extmap("2/foo urn:x")?;
    assert_eq!(ext.id, 2);
    assert_eq!(ext.direction, RTCRtpTransceiverDirection::Unspecified);
    assert_eq!(ext.uri, "urn:x");

    assert!(parse_extmap("2").is_err());

    Ok(())
}

#[test]
fn test_parse_ssrc_media() -> Result<()> {
    let s = parse_ssrc_media("3735928559 cname:user@example.com")?;
    assert_eq!(s.ssrc, 3735928559);
    assert_eq!(s.attribute, "cname");
    assert_eq!(s.value, "user@example.com");

    let s = parse_ssrc_media("1 mslabel")?;
    assert_eq!(s.attribute, "mslabel");
    assert_eq!(s.value, "");

    let s = parse_ssrc_media("1 msid:stream track:0")?;
    assert_eq!(s.attribute, "msid");
    assert_eq!(s.value, "stream track:0");

    assert_eq!(
        parse_ssrc_media("abc cname:x"),
        Err(Error::ErrInvalidSsrc("abc".to_owned()))
    );

    Ok(())
}

#[test]
fn test_find_and_match_attribute_prefix() -> Result<()> {
    let media = media_with(
        "video",
        &["96", "98"],
        &[
            ("rtpmap", "96 VP8/90000"),
            ("rtpmap", "98 VP9/90000"),
            ("fmtp", "98 profile-id=0"),
        ],
    );

    assert_eq!(
        find_attribute_prefix(&media, "rtpmap", "98 "),
        Some("98 VP9/90000")
    );
    assert_eq!(find_attribute_prefix(&media, "rtpmap", "100 "), None);
    assert_eq!(find_attribute_prefix(&media, "fmtp", "96 "), None);

    let mut seen = vec![];
    match_attribute_prefix(&media, "rtpmap", "", |v| {
        seen.push(v.to_owned());
        Ok(())
    })?;
    assert_eq!(seen, vec!["96 VP8/90000", "98 VP9/90000"]);

    let result = match_attribute_prefix(&media, "rtpmap", "", |_| Err(Error::ErrCodecNotFound));
    assert_eq!(result, Err(Error::ErrCodecNotFound));

    Ok(())
}

#[test]
fn test_parse_rtp_parameters() -> Result<()> {
    let media = media_with(
        "video",
        &["96", "97", "100"],
        &[
            ("rtpmap", "96 VP8/90000"),
            ("rtcp-fb", "96 nack"),
            ("rtcp-fb", "96 nack pli"),
            ("rtpmap", "100 H264/90000"),
            (
                "fmtp",
                "100 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42001f",
            ),
            ("rtcp-fb", "* ccm fir"),
            ("extmap", "1 urn:ietf:params:rtp-hdrext:sdes:mid"),
            ("extmap", "3/recvonly urn:ietf:params:rtp-hdrext:toffset"),
        ],
    );

    let params = parse_rtp_parameters(&media)?;

    // 97 has no rtpmap and is not a static payload type
    assert_eq!(params.codecs.len(), 2);

    let vp8 = params.get_codec_parameters(96)?;
    assert_eq!(vp8.name, "VP8");
    assert_eq!(vp8.mime_type, "video/VP8");
    assert!(vp8.parameters.is_empty());
    assert_eq!(
        vp8.rtcp_feedback,
        vec![
            RTCPFeedback {
                typ: "nack".to_owned(),
                parameter: "".to_owned(),
            },
            RTCPFeedback {
                typ: "nack".to_owned(),
                parameter: "pli".to_owned(),
            },
            RTCPFeedback {
                typ: "ccm".to_owned(),
                parameter: "fir".to_owned(),
            },
        ]
    );

    let h264 = params.get_codec_parameters(100)?;
    assert_eq!(h264.mime_type, "video/H264");
    assert_eq!(
        h264.parameters,
        map(&[
            ("level-asymmetry-allowed", "1"),
            ("packetization-mode", "1"),
            ("profile-level-id", "42001f"),
        ])
    );
    assert_eq!(h264.rtcp_feedback.len(), 1);

    assert_eq!(params.header_extensions.len(), 2);
    assert_eq!(params.header_extensions[0].id, 1);
    assert_eq!(
        params.header_extensions[0].direction,
        RTCRtpTransceiverDirection::Sendrecv
    );
    assert_eq!(
        params.header_extensions[1].direction,
        RTCRtpTransceiverDirection::Recvonly
    );
    assert!(!params.rtcp.reduced_size);

    Ok(())
}

#[test]
fn test_parse_rtp_parameters_static_payload_types() -> Result<()> {
    let media = media_with("audio", &["0", "8", "111"], &[("rtpmap", "111 opus/48000/2")]);

    let params = parse_rtp_parameters(&media)?;
    let names: Vec<&str> = params.codecs.iter().map(|c| c.mime_type.as_str()).collect();
    assert_eq!(names, vec!["audio/PCMU", "audio/PCMA", "audio/opus"]);
    assert_eq!(params.get_codec_parameters(0)?.clock_rate, 8000);

    Ok(())
}

#[test]
fn test_parse_rtp_parameters_skips_format_without_rtpmap() -> Result<()> {
    let media = media_with(
        "video",
        &["96", "127"],
        &[("rtpmap", "96 VP8/90000"), ("rtcp-fb", "127 nack")],
    );

    let params = parse_rtp_parameters(&media)?;
    assert_eq!(params.codecs.len(), 1);
    assert_eq!(params.codecs[0].payload_type, 96);
    assert_eq!(
        params.get_codec_parameters(127),
        Err(Error::ErrPayloadTypeNotFound(127))
    );

    Ok(())
}

#[test]
fn test_parse_rtp_parameters_errors_name_attribute() {
    let tests = vec![
        (
            media_with("video", &["96"], &[("rtpmap", "96 VP8")]),
            "rtpmap",
            Error::ErrInvalidCodec("VP8".to_owned()),
        ),
        (
            media_with(
                "video",
                &["96"],
                &[("rtpmap", "96 VP8/90000"), ("fmtp", "96 novalue")],
            ),
            "fmtp",
            Error::ErrInvalidFmtpParameter("novalue".to_owned()),
        ),
        (
            media_with(
                "video",
                &["96"],
                &[("rtpmap", "96 VP8/90000"), ("extmap", "x urn:x")],
            ),
            "extmap",
            Error::ErrInvalidExtmapId("x".to_owned()),
        ),
    ];

    for (media, attribute, source) in tests {
        let err = parse_rtp_parameters(&media).unwrap_err();
        assert_eq!(
            err,
            Error::ErrParseAttribute {
                attribute: attribute.to_owned(),
                source: Box::new(source),
            }
        );
        assert!(err.to_string().starts_with(&format!("failed to parse {attribute}")));
    }
}

#[test]
fn test_parse_decoding_parameters() -> Result<()> {
    let media = media_with(
        "video",
        &["96"],
        &[
            ("ssrc", "1111 msid:stream track"),
            ("ssrc", "2222 cname:first"),
            ("ssrc", "3333 cname:second"),
        ],
    );

    let decodings = parse_decoding_parameters(&media)?;
    assert_eq!(decodings.len(), 1);
    assert_eq!(decodings[0].ssrc, 2222);

    let params = parse_rtp_parameters(&media)?;
    assert_eq!(params.rtcp.cname, "first");

    let media = media_with("video", &["96"], &[("ssrc", "1111 msid:stream track")]);
    assert_eq!(
        parse_decoding_parameters(&media),
        Err(Error::ErrNoSsrcInMediaDescription)
    );

    let media = media_with("video", &["96"], &[("ssrc", "x cname:bad")]);
    assert!(matches!(
        parse_decoding_parameters(&media),
        Err(Error::ErrParseAttribute { .. })
    ));

    Ok(())
}

#[test]
fn test_parse_session_description() -> Result<()> {
    let must_parse = |raw: &str| -> Result<SessionDescription> {
        let mut reader = Cursor::new(raw.as_bytes());
        Ok(SessionDescription::unmarshal(&mut reader)?)
    };

    let sd = must_parse(
        "v=0\r
o=- 4596489990601351948 2 IN IP4 127.0.0.1\r
s=-\r
t=0 0\r
m=audio 9 UDP/TLS/RTP/SAVPF 111 9\r
c=IN IP4 0.0.0.0\r
a=rtcp-rsize\r
a=rtpmap:111 opus/48000/2\r
a=fmtp:111 minptime=10; useinbandfec=1\r
a=rtcp-fb:111 transport-cc\r
a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r
a=ssrc:2345 cname:webrtc-rs\r
",
    )?;

    let media = &sd.media_descriptions[0];
    let params = parse_rtp_parameters(media)?;

    assert_eq!(params.codecs.len(), 2);
    let opus = params.get_codec_parameters(111)?;
    assert_eq!(opus.mime_type, "audio/opus");
    assert_eq!(opus.channels, 2);
    assert!(opus.equal_fmtp("useinbandfec=1;minptime=10")?);

    let g722 = params.get_codec_parameters(9)?;
    assert_eq!(g722.mime_type, "audio/G722");

    assert!(params.rtcp.reduced_size);
    assert_eq!(params.rtcp.cname, "webrtc-rs");

    let decodings = parse_decoding_parameters(media)?;
    assert_eq!(decodings[0].ssrc, 2345);

    Ok(())
}
