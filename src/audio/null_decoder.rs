use crate::memory::GuestMemory;
use crate::protocol::{
    BinaryMessage, DecodeAacResponse, DecoderCodec, DecoderCommand, ResultStatus,
};

use super::{DspDecoder, DEFAULT_CHANNELS, SAMPLES_PER_FRAME};

/// Answers every AAC request with silence. Used when no transform backend
/// is wanted; guest software keeps running, it just hears nothing.
#[derive(Debug, Default)]
pub struct NullDecoder;

impl NullDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DspDecoder for NullDecoder {
    fn process_request(
        &mut self,
        _memory: &mut dyn GuestMemory,
        request: &BinaryMessage,
    ) -> Option<BinaryMessage> {
        if request.header.codec != DecoderCodec::DecodeAac {
            log::error!("Got unknown codec {}", u16::from(request.header.codec));
            return None;
        }

        match request.header.cmd {
            DecoderCommand::Init | DecoderCommand::Unknown => {
                let mut response = request.clone();
                response.header.result = ResultStatus::Success;
                Some(response)
            }
            DecoderCommand::EncodeDecode => {
                let mut response =
                    BinaryMessage::new(request.header.codec, request.header.cmd);
                response.set_decode_aac_response(&DecodeAacResponse {
                    size: request.decode_aac_request().size,
                    num_channels: DEFAULT_CHANNELS,
                    num_samples: SAMPLES_PER_FRAME,
                    ..Default::default()
                });
                Some(response)
            }
            DecoderCommand::Other(raw) => {
                log::error!("Got unknown binary request: {}", raw);
                None
            }
        }
    }

    fn is_valid(&self) -> bool {
        true
    }
}
