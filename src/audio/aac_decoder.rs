//! AAC decode requests served through a platform audio transform.

use crate::config::DecoderConfig;
use crate::memory::GuestMemory;
use crate::protocol::{
    BinaryMessage, DecodeAacResponse, DecoderCodec, DecoderCommand, ResultStatus,
};

use super::adts::detect_media_type;
use super::decode_loop::{drain, ChannelBuffers, DrainOutcome};
use super::negotiator::StreamNegotiator;
use super::session::TransformSession;
use super::transform::{InputSample, InputStatus, MediaSubsystem, Transform};
use super::{DspDecoder, DEFAULT_CHANNELS, SAMPLES_PER_FRAME};

pub struct AacDecoder<S: MediaSubsystem> {
    session: TransformSession<S>,
    negotiator: StreamNegotiator,
    config: DecoderConfig,
}

impl<S: MediaSubsystem> AacDecoder<S> {
    pub fn new(subsystem: S, config: DecoderConfig) -> Self {
        Self {
            session: TransformSession::new(subsystem),
            negotiator: StreamNegotiator::new(),
            config,
        }
    }

    fn initialize(&mut self, request: &BinaryMessage) -> Option<BinaryMessage> {
        let mut response = request.clone();
        response.header.result = ResultStatus::Success;
        // The guest re-initializing the DSP means a new stream may follow.
        self.negotiator.reset();
        Some(response)
    }

    fn decode(
        &mut self,
        memory: &mut dyn GuestMemory,
        request: &BinaryMessage,
    ) -> Option<BinaryMessage> {
        let req = request.decode_aac_request();
        let mut response = BinaryMessage::new(request.header.codec, request.header.cmd);
        let mut info = DecodeAacResponse {
            size: req.size,
            num_channels: DEFAULT_CHANNELS,
            num_samples: SAMPLES_PER_FRAME,
            ..Default::default()
        };

        let ids = self.session.stream_ids();
        let Some(transform) = self.session.transform() else {
            // Keep the guest running even without a working decoder.
            log::debug!("Decoder not initialized");
            response.set_decode_aac_response(&info);
            return Some(response);
        };

        let mut out = ChannelBuffers::default();
        let mut reconfigures = 0u32;
        loop {
            let Some(data) = memory.read(req.src_addr, req.size as usize) else {
                log::error!("Got out of bounds src_addr {:08x}", req.src_addr);
                return None;
            };

            let Some(meta) = detect_media_type(data) else {
                log::error!("Unable to deduce decoding parameters from ADTS stream");
                response.set_decode_aac_response(&info);
                return Some(response);
            };
            let sample = InputSample::clean_point(data);

            info.sample_rate = meta.sample_rate_enum();
            info.num_channels = u32::from(meta.channels());

            if let Err(e) = self.negotiator.ensure_configured(transform, ids, &meta) {
                log::error!("Failed to select media types: {}", e);
            }

            // Output from before a format change is stale.
            out.iter_mut().for_each(Vec::clear);
            let outcome = submit_and_drain(
                transform,
                ids.input,
                ids.output,
                &sample,
                usize::from(meta.channels()),
                self.config.max_input_retries,
                &mut out,
            );

            match outcome {
                DrainOutcome::NeedMoreInput => break,
                DrainOutcome::Fatal => {
                    log::error!("Errors occurred when receiving output");
                    break;
                }
                DrainOutcome::NeedReconfig => {
                    self.negotiator.reset();
                    if let Err(e) = transform.flush() {
                        log::warn!("Failed to flush decoder: {}", e);
                    }
                    reconfigures += 1;
                    if reconfigures > self.config.max_reconfigure_attempts {
                        log::error!(
                            "Decoder still wants reconfiguration after {} attempts",
                            self.config.max_reconfigure_attempts
                        );
                        // Nothing decoded in the current format; keep the guest buffers as they are.
                        out.iter_mut().for_each(Vec::clear);
                        break;
                    }
                    log::debug!("Stream format changed, decoding again");
                }
            }
        }

        let destinations = [req.dst_addr_ch0, req.dst_addr_ch1];
        for (channel, (bytes, &addr)) in out.iter().zip(&destinations).enumerate() {
            if !bytes.is_empty() && !memory.contains(addr, bytes.len()) {
                log::error!("Got out of bounds dst_addr_ch{} {:08x}", channel, addr);
                return None;
            }
        }
        for (bytes, &addr) in out.iter().zip(&destinations) {
            if bytes.is_empty() {
                continue;
            }
            if let Some(dst) = memory.write(addr, bytes.len()) {
                dst.copy_from_slice(bytes);
            }
        }

        response.set_decode_aac_response(&info);
        Some(response)
    }
}

/// Submit one frame and drain it, resubmitting while the transform rejects
/// input. `max_retries == 0` keeps resubmitting until it accepts.
fn submit_and_drain<T: Transform>(
    transform: &mut T,
    in_stream: u32,
    out_stream: u32,
    sample: &InputSample,
    channels: usize,
    max_retries: u32,
    out: &mut ChannelBuffers,
) -> DrainOutcome {
    let mut retries = 0u32;
    loop {
        let input = transform.submit(in_stream, sample);
        // Output must be checked even when the input was not accepted.
        let outcome = drain(transform, out_stream, channels, out);
        if outcome != DrainOutcome::Fatal || input != InputStatus::NotAccepted {
            return outcome;
        }
        retries += 1;
        if max_retries != 0 && retries >= max_retries {
            log::warn!("Decoder rejected input {} times, giving up", retries);
            return outcome;
        }
    }
}

impl<S: MediaSubsystem> DspDecoder for AacDecoder<S> {
    fn process_request(
        &mut self,
        memory: &mut dyn GuestMemory,
        request: &BinaryMessage,
    ) -> Option<BinaryMessage> {
        if request.header.codec != DecoderCodec::DecodeAac {
            log::error!("Got unknown codec {}", u16::from(request.header.codec));
            return None;
        }

        match request.header.cmd {
            DecoderCommand::Init => {
                log::info!("AacDecoder initializing");
                self.initialize(request)
            }
            DecoderCommand::EncodeDecode => self.decode(memory, request),
            DecoderCommand::Unknown => {
                let mut response = request.clone();
                response.header.result = ResultStatus::Success;
                Some(response)
            }
            DecoderCommand::Other(raw) => {
                log::error!("Got unknown binary request: {}", raw);
                None
            }
        }
    }

    fn is_valid(&self) -> bool {
        self.session.is_valid()
    }
}
