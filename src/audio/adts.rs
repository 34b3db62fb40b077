//! ADTS frame header parsing and the stream metadata derived from it.

use crate::protocol::DecoderSampleRate;

pub const ADTS_HEADER_LEN: usize = 7;
/// Header length when a CRC follows the fixed header.
pub const ADTS_HEADER_LEN_CRC: usize = 9;

/// Sample rate index to frequency, ISO/IEC 14496-3.
const SAMPLE_RATE_TABLE: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    pub mpeg2: bool,
    pub protection_absent: bool,
    /// Audio object type (profile field + 1).
    pub profile: u8,
    pub samplerate_idx: u8,
    pub samplerate: u32,
    pub channel_idx: u8,
    pub channels: u8,
    /// Whole frame length in bytes, header included.
    pub length: u16,
    pub framecount: u8,
}

impl AdtsHeader {
    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_LEN
        } else {
            ADTS_HEADER_LEN_CRC
        }
    }
}

/// Parse the fixed + variable ADTS header at the start of `buf`.
pub fn parse_adts(buf: &[u8]) -> Option<AdtsHeader> {
    if buf.len() < ADTS_HEADER_LEN {
        return None;
    }
    let sync = (u16::from(buf[0]) << 8) | u16::from(buf[1]);
    if sync & 0xFFF0 != 0xFFF0 {
        return None;
    }

    let samplerate_idx = (buf[2] >> 2) & 0xF;
    let samplerate = *SAMPLE_RATE_TABLE.get(samplerate_idx as usize)?;
    let channel_idx = ((buf[2] & 0x1) << 2) | ((buf[3] >> 6) & 0x3);
    let length = (u16::from(buf[3] & 0x3) << 11)
        | (u16::from(buf[4]) << 3)
        | (u16::from(buf[5]) >> 5);

    Some(AdtsHeader {
        mpeg2: (buf[1] >> 3) & 0x1 == 1,
        protection_absent: buf[1] & 0x1 == 1,
        profile: (buf[2] >> 6) + 1,
        samplerate_idx,
        samplerate,
        channel_idx,
        channels: if channel_idx == 7 { 8 } else { channel_idx },
        length,
        framecount: (buf[6] & 0x3) + 1,
    })
}

/// AudioSpecificConfig word handed to the codec as user data.
pub fn aac_tag(header: &AdtsHeader) -> u16 {
    (u16::from(header.profile) << 11)
        | (u16::from(header.samplerate_idx) << 7)
        | (u16::from(header.channel_idx) << 3)
}

/// Stream parameters recovered from a compressed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMeta {
    pub header: AdtsHeader,
    pub aac_tag: u16,
}

impl StreamMeta {
    pub fn channels(&self) -> u8 {
        self.header.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.samplerate
    }

    pub fn sample_rate_enum(&self) -> DecoderSampleRate {
        DecoderSampleRate::from_hz(self.header.samplerate)
    }

    pub fn frame_length(&self) -> u16 {
        self.header.length
    }
}

/// Detect stream metadata, `None` when the buffer carries no usable header.
pub fn detect_media_type(buf: &[u8]) -> Option<StreamMeta> {
    let header = parse_adts(buf)?;
    if header.length == 0 {
        return None;
    }
    Some(StreamMeta {
        header,
        aac_tag: aac_tag(&header),
    })
}

/// Split an ADTS stream into `(offset, len)` frames by header length.
/// Stops at the first byte run that is not a whole frame.
pub fn split_frames(stream: &[u8]) -> Vec<(usize, usize)> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < stream.len() {
        let Some(meta) = detect_media_type(&stream[offset..]) else {
            log::warn!("Lost ADTS sync at byte {}, ignoring the rest", offset);
            break;
        };
        let len = usize::from(meta.frame_length());
        if offset + len > stream.len() {
            log::warn!("Truncated frame at byte {}", offset);
            break;
        }
        frames.push((offset, len));
        offset += len;
    }
    frames
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a protection-absent ADTS header for an MPEG-4 AAC-LC frame.
    pub(crate) fn adts_frame(samplerate_idx: u8, channel_idx: u8, payload: &[u8]) -> Vec<u8> {
        let length = (ADTS_HEADER_LEN + payload.len()) as u16;
        let mut frame = vec![
            0xFF,
            0xF1,
            (1 << 6) | (samplerate_idx << 2) | (channel_idx >> 2),
            ((channel_idx & 0x3) << 6) | ((length >> 11) & 0x3) as u8,
            ((length >> 3) & 0xFF) as u8,
            (((length & 0x7) << 5) as u8) | 0x1F,
            0xFC,
        ];
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn parses_lc_stereo_44100() {
        let frame = adts_frame(4, 2, &[0u8; 100]);
        let header = parse_adts(&frame).unwrap();
        assert_eq!(header.profile, 2);
        assert_eq!(header.samplerate, 44100);
        assert_eq!(header.channels, 2);
        assert_eq!(header.length, 107);
        assert_eq!(header.framecount, 1);
        assert!(header.protection_absent);
        assert!(!header.mpeg2);
        assert_eq!(header.header_len(), 7);
    }

    #[test]
    fn tag_matches_audio_specific_config() {
        // AAC-LC, 44.1 kHz, stereo => 0x1210
        let frame = adts_frame(4, 2, &[0u8; 8]);
        let meta = detect_media_type(&frame).unwrap();
        assert_eq!(meta.aac_tag, 0x1210);
        assert_eq!(meta.sample_rate_enum(), DecoderSampleRate::Rate44100);
    }

    #[test]
    fn channel_config_seven_is_eight_channels() {
        let frame = adts_frame(3, 7, &[0u8; 8]);
        assert_eq!(parse_adts(&frame).unwrap().channels, 8);
    }

    #[test]
    fn rejects_missing_sync_short_and_reserved_rate() {
        assert!(parse_adts(&[0u8; 16]).is_none());
        assert!(parse_adts(&[0xFF, 0xF1, 0x50]).is_none());
        let mut frame = adts_frame(4, 2, &[0u8; 8]);
        frame[2] = (1 << 6) | (13 << 2);
        assert!(parse_adts(&frame).is_none());
    }

    #[test]
    fn zero_length_frame_has_no_metadata() {
        let mut frame = adts_frame(4, 2, &[]);
        frame[3] &= 0xFC;
        frame[4] = 0;
        frame[5] &= 0x1F;
        assert!(parse_adts(&frame).is_some());
        assert!(detect_media_type(&frame).is_none());
    }

    #[test]
    fn splits_back_to_back_frames() {
        let mut stream = adts_frame(4, 2, &[0u8; 10]);
        stream.extend(adts_frame(4, 2, &[0u8; 3]));
        assert_eq!(split_frames(&stream), vec![(0, 17), (17, 10)]);
    }

    #[test]
    fn split_stops_at_lost_sync_and_truncation() {
        let mut stream = adts_frame(4, 2, &[0u8; 10]);
        stream.extend_from_slice(&[0x12, 0x34, 0x56]);
        stream.extend(adts_frame(4, 2, &[0u8; 10]));
        assert_eq!(split_frames(&stream), vec![(0, 17)]);

        let mut stream = adts_frame(4, 1, &[0u8; 10]);
        let second = adts_frame(4, 1, &[0u8; 10]);
        stream.extend_from_slice(&second[..12]);
        assert_eq!(split_frames(&stream), vec![(0, 17)]);

        assert!(split_frames(&[]).is_empty());
    }
}
