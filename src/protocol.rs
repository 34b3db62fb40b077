//! Fixed-layout binary messages exchanged with the DSP decoder.
//!
//! Every message is 32 bytes, little-endian: an 8 byte header
//! (`codec: u16`, `cmd: u16`, `result: u32`) followed by a 24 byte payload
//! whose meaning depends on the command.

use bytes::{Buf, BufMut};
use serde::Serialize;
use thiserror::Error;

pub const MESSAGE_SIZE: usize = 32;
const PAYLOAD_SIZE: usize = 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("message too short: need 32 bytes, got {0}")]
    Truncated(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecoderCodec {
    None,
    DecodeAac,
    EncodeAac,
    Other(u16),
}

impl From<u16> for DecoderCodec {
    fn from(raw: u16) -> Self {
        match raw {
            0 => DecoderCodec::None,
            1 => DecoderCodec::DecodeAac,
            2 => DecoderCodec::EncodeAac,
            other => DecoderCodec::Other(other),
        }
    }
}

impl From<DecoderCodec> for u16 {
    fn from(codec: DecoderCodec) -> Self {
        match codec {
            DecoderCodec::None => 0,
            DecoderCodec::DecodeAac => 1,
            DecoderCodec::EncodeAac => 2,
            DecoderCodec::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecoderCommand {
    Init,
    EncodeDecode,
    Unknown,
    Other(u16),
}

impl From<u16> for DecoderCommand {
    fn from(raw: u16) -> Self {
        match raw {
            0 => DecoderCommand::Init,
            1 => DecoderCommand::EncodeDecode,
            2 => DecoderCommand::Unknown,
            other => DecoderCommand::Other(other),
        }
    }
}

impl From<DecoderCommand> for u16 {
    fn from(cmd: DecoderCommand) -> Self {
        match cmd {
            DecoderCommand::Init => 0,
            DecoderCommand::EncodeDecode => 1,
            DecoderCommand::Unknown => 2,
            DecoderCommand::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultStatus {
    Success,
    Error,
    Other(u32),
}

impl From<u32> for ResultStatus {
    fn from(raw: u32) -> Self {
        match raw {
            0 => ResultStatus::Success,
            1 => ResultStatus::Error,
            other => ResultStatus::Other(other),
        }
    }
}

impl From<ResultStatus> for u32 {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Success => 0,
            ResultStatus::Error => 1,
            ResultStatus::Other(raw) => raw,
        }
    }
}

/// Sample rate as reported back to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[repr(u32)]
pub enum DecoderSampleRate {
    #[default]
    Rate48000 = 0,
    Rate44100 = 1,
    Rate32000 = 2,
    Rate24000 = 3,
    Rate22050 = 4,
    Rate16000 = 5,
    Rate12000 = 6,
    Rate11025 = 7,
    Rate8000 = 8,
}

impl DecoderSampleRate {
    /// Maps a rate in Hz onto the guest enum. Unlisted rates fall back to 48 kHz.
    pub fn from_hz(hz: u32) -> Self {
        match hz {
            48000 => DecoderSampleRate::Rate48000,
            44100 => DecoderSampleRate::Rate44100,
            32000 => DecoderSampleRate::Rate32000,
            24000 => DecoderSampleRate::Rate24000,
            22050 => DecoderSampleRate::Rate22050,
            16000 => DecoderSampleRate::Rate16000,
            12000 => DecoderSampleRate::Rate12000,
            11025 => DecoderSampleRate::Rate11025,
            8000 => DecoderSampleRate::Rate8000,
            other => {
                log::warn!("Unknown decoder sample rate: {}", other);
                DecoderSampleRate::Rate48000
            }
        }
    }

    fn from_raw(raw: u32) -> Self {
        match raw {
            1 => DecoderSampleRate::Rate44100,
            2 => DecoderSampleRate::Rate32000,
            3 => DecoderSampleRate::Rate24000,
            4 => DecoderSampleRate::Rate22050,
            5 => DecoderSampleRate::Rate16000,
            6 => DecoderSampleRate::Rate12000,
            7 => DecoderSampleRate::Rate11025,
            8 => DecoderSampleRate::Rate8000,
            _ => DecoderSampleRate::Rate48000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    pub codec: DecoderCodec,
    pub cmd: DecoderCommand,
    pub result: ResultStatus,
}

/// Payload of an `EncodeDecode` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DecodeAacRequest {
    pub src_addr: u32,
    pub size: u32,
    pub dst_addr_ch0: u32,
    pub dst_addr_ch1: u32,
    pub unknown1: u32,
    pub unknown2: u32,
}

/// Payload of an `EncodeDecode` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DecodeAacResponse {
    pub sample_rate: DecoderSampleRate,
    pub num_channels: u32,
    pub size: u32,
    pub unknown1: u32,
    pub unknown2: u32,
    pub num_samples: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryMessage {
    pub header: MessageHeader,
    pub payload: [u8; PAYLOAD_SIZE],
}

impl BinaryMessage {
    pub fn new(codec: DecoderCodec, cmd: DecoderCommand) -> Self {
        Self {
            header: MessageHeader {
                codec,
                cmd,
                result: ResultStatus::Success,
            },
            payload: [0; PAYLOAD_SIZE],
        }
    }

    pub fn decode_request(request: DecodeAacRequest) -> Self {
        let mut message = Self::new(DecoderCodec::DecodeAac, DecoderCommand::EncodeDecode);
        message.set_decode_aac_request(&request);
        message
    }

    pub fn from_bytes(mut raw: &[u8]) -> Result<Self, ProtocolError> {
        if raw.len() < MESSAGE_SIZE {
            return Err(ProtocolError::Truncated(raw.len()));
        }
        let header = MessageHeader {
            codec: raw.get_u16_le().into(),
            cmd: raw.get_u16_le().into(),
            result: raw.get_u32_le().into(),
        };
        let mut payload = [0u8; PAYLOAD_SIZE];
        raw.copy_to_slice(&mut payload);
        Ok(Self { header, payload })
    }

    pub fn to_bytes(&self) -> [u8; MESSAGE_SIZE] {
        let mut out = [0u8; MESSAGE_SIZE];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.header.codec.into());
        buf.put_u16_le(self.header.cmd.into());
        buf.put_u32_le(self.header.result.into());
        buf.put_slice(&self.payload);
        out
    }

    pub fn decode_aac_request(&self) -> DecodeAacRequest {
        let mut p = &self.payload[..];
        DecodeAacRequest {
            src_addr: p.get_u32_le(),
            size: p.get_u32_le(),
            dst_addr_ch0: p.get_u32_le(),
            dst_addr_ch1: p.get_u32_le(),
            unknown1: p.get_u32_le(),
            unknown2: p.get_u32_le(),
        }
    }

    pub fn set_decode_aac_request(&mut self, request: &DecodeAacRequest) {
        let mut p = &mut self.payload[..];
        p.put_u32_le(request.src_addr);
        p.put_u32_le(request.size);
        p.put_u32_le(request.dst_addr_ch0);
        p.put_u32_le(request.dst_addr_ch1);
        p.put_u32_le(request.unknown1);
        p.put_u32_le(request.unknown2);
    }

    pub fn decode_aac_response(&self) -> DecodeAacResponse {
        let mut p = &self.payload[..];
        DecodeAacResponse {
            sample_rate: DecoderSampleRate::from_raw(p.get_u32_le()),
            num_channels: p.get_u32_le(),
            size: p.get_u32_le(),
            unknown1: p.get_u32_le(),
            unknown2: p.get_u32_le(),
            num_samples: p.get_u32_le(),
        }
    }

    pub fn set_decode_aac_response(&mut self, response: &DecodeAacResponse) {
        let mut p = &mut self.payload[..];
        p.put_u32_le(response.sample_rate as u32);
        p.put_u32_le(response.num_channels);
        p.put_u32_le(response.size);
        p.put_u32_le(response.unknown1);
        p.put_u32_le(response.unknown2);
        p.put_u32_le(response.num_samples);
    }
}
