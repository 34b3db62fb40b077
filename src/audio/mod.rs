//! audio - HLE AAC decoding for the DSP binary message interface
//!
//! Requests arrive as fixed-layout binary messages that point into guest
//! memory. Decoding is delegated to a transform behind the
//! [`transform::MediaSubsystem`] capability; the portable backend uses
//! Symphonia.

pub mod aac_decoder;
pub mod adts;
pub mod decode_loop;
pub mod negotiator;
pub mod null_decoder;
pub mod session;
pub mod software;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DecoderConfig;
use crate::memory::GuestMemory;
use crate::protocol::BinaryMessage;

pub use aac_decoder::AacDecoder;
pub use null_decoder::NullDecoder;
pub use software::SoftwareSubsystem;

/// Channel count reported when the stream does not say otherwise.
pub const DEFAULT_CHANNELS: u32 = 2;
/// Samples per channel in one AAC frame.
pub const SAMPLES_PER_FRAME: u32 = 1024;

/// A DSP-side decoder answering binary requests.
///
/// `None` means the request was rejected outright; the caller must treat a
/// missing response as fatal for that request.
pub trait DspDecoder {
    fn process_request(
        &mut self,
        memory: &mut dyn GuestMemory,
        request: &BinaryMessage,
    ) -> Option<BinaryMessage>;

    fn is_valid(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderBackend {
    Software,
    Null,
}

impl FromStr for DecoderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "software" => Ok(DecoderBackend::Software),
            "null" => Ok(DecoderBackend::Null),
            other => anyhow::bail!("Unsupported decoder backend: {}", other),
        }
    }
}

/// Factory function: create a decoder for the configured backend.
pub fn create_decoder(config: &DecoderConfig) -> Box<dyn DspDecoder> {
    match config.backend {
        DecoderBackend::Software => {
            let decoder = AacDecoder::new(SoftwareSubsystem::new(), config.clone());
            if !decoder.is_valid() {
                log::warn!("AAC decoder unavailable, requests will decode to silence");
            }
            Box::new(decoder)
        }
        DecoderBackend::Null => Box::new(NullDecoder::new()),
    }
}
