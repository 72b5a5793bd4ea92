#[cfg(test)]
mod sdp_attributes_test;

use std::collections::HashMap;

use sdp::description::media::MediaDescription;

use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::{
    RTCRtpCodecParameters, RTCRtpHeaderExtensionParameters, RTCRtpParameters,
};
use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use crate::rtp_transceiver::{RTCPFeedback, RTCRtpDecodingParameters, PayloadType, SSRC};

pub const ATTR_KEY_RTPMAP: &str = "rtpmap";
pub const ATTR_KEY_FMTP: &str = "fmtp";
pub const ATTR_KEY_RTCP_FB: &str = "rtcp-fb";
pub const ATTR_KEY_EXTMAP: &str = "extmap";
pub const ATTR_KEY_SSRC: &str = "ssrc";
pub const ATTR_KEY_RTCP_RSIZE: &str = "rtcp-rsize";

const SSRC_ATTRIBUTE_CNAME: &str = "cname";
const WILDCARD_PREFIX: &str = "* ";

/// SsrcMedia is a RFC 5576 source-level attribute.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SsrcMedia {
    pub ssrc: SSRC,
    pub attribute: String,
    pub value: String,
}

/// Static payload types that may be listed without an rtpmap line.
/// <https://tools.ietf.org/html/rfc3551#section-6>
fn static_payload_type(payload_type: PayloadType) -> Option<(&'static str, u32)> {
    match payload_type {
        0 => Some(("PCMU", 8000)),
        8 => Some(("PCMA", 8000)),
        9 => Some(("G722", 8000)),
        _ => None,
    }
}

/// splits `value` at its first space, which must not be the first character
fn split_first_space<'a>(attribute: &str, value: &'a str) -> Result<(&'a str, &'a str)> {
    match value.find(' ') {
        Some(sp) if sp >= 1 => Ok((&value[..sp], &value[sp + 1..])),
        _ => Err(Error::ErrAttributeTooShort {
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        }),
    }
}

/// parse_rtp_map parses the value of an rtpmap line. Sample input:
/// `109 opus/48000/2`
pub fn parse_rtp_map(value: &str) -> Result<RTCRtpCodecParameters> {
    let (payload_type, codec) = split_first_space(ATTR_KEY_RTPMAP, value)?;
    let payload_type = payload_type
        .parse::<PayloadType>()
        .map_err(|_| Error::ErrInvalidPayloadType(payload_type.to_owned()))?;

    let parts: Vec<&str> = codec.split('/').collect();
    if parts.len() < 2 {
        return Err(Error::ErrInvalidCodec(codec.to_owned()));
    }

    let clock_rate = parts[1]
        .parse::<u32>()
        .map_err(|_| Error::ErrInvalidClockRate(parts[1].to_owned()))?;

    let channels = match parts.get(2) {
        Some(channels) => channels
            .parse::<u16>()
            .map_err(|_| Error::ErrInvalidChannels((*channels).to_owned()))?,
        None => 0,
    };

    Ok(RTCRtpCodecParameters {
        name: parts[0].to_owned(),
        payload_type,
        clock_rate,
        channels,
        ..Default::default()
    })
}

/// parse_fmtp parses the value of an fmtp line, dropping the leading
/// payload type. Sample input: `96 vbr=on;cng=on`
pub fn parse_fmtp(value: &str) -> Result<HashMap<String, String>> {
    let (_, params) = split_first_space(ATTR_KEY_FMTP, value)?;
    parse_fmtp_string(params)
}

/// parse_fmtp_string parses a format parameter list such as `vbr=on; cng=on`.
pub fn parse_fmtp_string(params: &str) -> Result<HashMap<String, String>> {
    let mut res = HashMap::new();

    for param in params.split(';') {
        if param.trim().is_empty() {
            continue;
        }
        let (k, v) = param
            .split_once('=')
            .ok_or_else(|| Error::ErrInvalidFmtpParameter(param.to_owned()))?;
        res.insert(k.trim().to_owned(), v.trim().to_owned());
    }

    Ok(res)
}

/// parse_rtcp_feedback parses the value of an rtcp-fb line. Sample input:
/// `98 nack rpsi`
pub fn parse_rtcp_feedback(value: &str) -> Result<RTCPFeedback> {
    let (_, fb) = split_first_space(ATTR_KEY_RTCP_FB, value)?;

    let (typ, parameter) = match fb.find(' ') {
        Some(sp) if sp > 0 => (&fb[..sp], &fb[sp + 1..]),
        _ => (fb, ""),
    };

    Ok(RTCPFeedback {
        typ: typ.to_owned(),
        parameter: parameter.to_owned(),
    })
}

/// parse_extmap parses the value of an extmap line (RFC 5285). Sample input:
/// `2/sendonly urn:ietf:params:rtp-hdrext:toffset`
pub fn parse_extmap(value: &str) -> Result<RTCRtpHeaderExtensionParameters> {
    let (id_dir, uri) = split_first_space(ATTR_KEY_EXTMAP, value)?;

    // an unknown direction token is kept as Unspecified
    let (id, direction) = match id_dir.split_once('/') {
        Some((id, direction)) => (id, RTCRtpTransceiverDirection::from(direction)),
        None => (id_dir, RTCRtpTransceiverDirection::Sendrecv),
    };

    let id = id
        .parse::<u16>()
        .map_err(|_| Error::ErrInvalidExtmapId(id.to_owned()))?;

    Ok(RTCRtpHeaderExtensionParameters {
        id,
        direction,
        uri: uri.to_owned(),
    })
}

/// parse_ssrc_media parses the value of an ssrc line. Sample input:
/// `3735928559 cname:{user-id}` or `3735928559 mslabel`
pub fn parse_ssrc_media(value: &str) -> Result<SsrcMedia> {
    let (ssrc, rest) = split_first_space(ATTR_KEY_SSRC, value)?;
    let ssrc = ssrc
        .parse::<SSRC>()
        .map_err(|_| Error::ErrInvalidSsrc(ssrc.to_owned()))?;

    let (attribute, value) = rest.split_once(':').unwrap_or((rest, ""));

    Ok(SsrcMedia {
        ssrc,
        attribute: attribute.to_owned(),
        value: value.to_owned(),
    })
}

/// match_attribute_prefix calls `f` with the value of every attribute named
/// `key` whose value starts with `prefix`, stopping at the first error.
pub fn match_attribute_prefix<F>(
    media: &MediaDescription,
    key: &str,
    prefix: &str,
    mut f: F,
) -> Result<()>
where
    F: FnMut(&str) -> Result<()>,
{
    for value in attribute_values(media, key) {
        if value.starts_with(prefix) {
            f(value)?;
        }
    }
    Ok(())
}

/// find_attribute_prefix returns the value of the first attribute named `key`
/// whose value starts with `prefix`.
pub fn find_attribute_prefix<'a>(
    media: &'a MediaDescription,
    key: &str,
    prefix: &str,
) -> Option<&'a str> {
    media
        .attributes
        .iter()
        .filter(|a| a.key == key)
        .filter_map(|a| a.value.as_deref())
        .find(|value| value.starts_with(prefix))
}

fn attribute_values<'a>(
    media: &'a MediaDescription,
    key: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    media
        .attributes
        .iter()
        .filter(move |a| a.key == key)
        .filter_map(|a| a.value.as_deref())
}

/// parse_rtp_parameters collects the codecs, header extensions and RTCP
/// settings signaled in one media section.
pub fn parse_rtp_parameters(media: &MediaDescription) -> Result<RTCRtpParameters> {
    let mut params = RTCRtpParameters::default();
    let kind = media.media_name.media.as_str();

    for format in &media.media_name.formats {
        let mut codecs = vec![];
        match_attribute_prefix(media, ATTR_KEY_RTPMAP, &format!("{format} "), |value| {
            codecs.push(parse_rtp_map(value)?);
            Ok(())
        })
        .map_err(|err| err.in_attribute(ATTR_KEY_RTPMAP))?;

        if codecs.is_empty() {
            let implicit = format.parse::<PayloadType>().ok().and_then(|pt| {
                static_payload_type(pt).map(|(name, clock_rate)| (pt, name, clock_rate))
            });
            match implicit {
                Some((payload_type, name, clock_rate)) => codecs.push(RTCRtpCodecParameters {
                    name: name.to_owned(),
                    payload_type,
                    clock_rate,
                    ..Default::default()
                }),
                // formats without rtpmap are not negotiable
                None => continue,
            }
        }

        for mut codec in codecs {
            codec.mime_type = format!("{kind}/{}", codec.name);
            let prefix = format!("{} ", codec.payload_type);

            match_attribute_prefix(media, ATTR_KEY_FMTP, &prefix, |value| {
                codec.parameters = parse_fmtp(value)?;
                Ok(())
            })
            .map_err(|err| err.in_attribute(ATTR_KEY_FMTP))?;

            for prefix in [prefix.as_str(), WILDCARD_PREFIX] {
                match_attribute_prefix(media, ATTR_KEY_RTCP_FB, prefix, |value| {
                    codec.rtcp_feedback.push(parse_rtcp_feedback(value)?);
                    Ok(())
                })
                .map_err(|err| err.in_attribute(ATTR_KEY_RTCP_FB))?;
            }

            params.codecs.push(codec);
        }
    }

    match_attribute_prefix(media, ATTR_KEY_EXTMAP, "", |value| {
        params.header_extensions.push(parse_extmap(value)?);
        Ok(())
    })
    .map_err(|err| err.in_attribute(ATTR_KEY_EXTMAP))?;

    params.rtcp.reduced_size = media
        .attributes
        .iter()
        .any(|a| a.key == ATTR_KEY_RTCP_RSIZE);
    if let Some(cname) = cname_sources(media)?.into_iter().next() {
        params.rtcp.cname = cname.value;
    }

    Ok(params)
}

/// parse_decoding_parameters selects the decoding target of one media
/// section. Only the first cname tagged source is used.
pub fn parse_decoding_parameters(media: &MediaDescription) -> Result<Vec<RTCRtpDecodingParameters>> {
    let sources = cname_sources(media)?;
    let primary = sources.first().ok_or(Error::ErrNoSsrcInMediaDescription)?;

    Ok(vec![RTCRtpDecodingParameters {
        ssrc: primary.ssrc,
        ..Default::default()
    }])
}

fn cname_sources(media: &MediaDescription) -> Result<Vec<SsrcMedia>> {
    let mut sources = vec![];
    match_attribute_prefix(media, ATTR_KEY_SSRC, "", |value| {
        let source = parse_ssrc_media(value)?;
        if source.attribute == SSRC_ATTRIBUTE_CNAME {
            sources.push(source);
        }
        Ok(())
    })
    .map_err(|err| err.in_attribute(ATTR_KEY_SSRC))?;
    Ok(sources)
}
