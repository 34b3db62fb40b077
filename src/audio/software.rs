//! Portable transform backed by Symphonia's AAC-LC decoder.
//!
//! Mirrors the contract of the platform transform closely enough for the
//! adapter: one pending input frame at a time, `NotAccepted` while it is
//! undrained, `NeedReconfig` when a frame's header disagrees with the
//! selected input type.

use symphonia::core::audio::{Channels, SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_AAC};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::Packet;
use symphonia::default::get_codecs;

use super::adts::parse_adts;
use super::transform::{
    AacPayload, InputMediaType, InputSample, InputStatus, MediaSubsystem, OutputMediaType,
    OutputStatus, Startup, StreamIds, Transform, TransformError, TransformResult,
};

#[derive(Debug, Default)]
pub struct SoftwareSubsystem {
    environment_ready: bool,
}

impl SoftwareSubsystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaSubsystem for SoftwareSubsystem {
    type Transform = SoftwareTransform;

    fn init_environment(&mut self) -> TransformResult<Startup> {
        if self.environment_ready {
            return Ok(Startup::AlreadyInitialized);
        }
        self.environment_ready = true;
        Ok(Startup::Initialized)
    }

    fn startup(&mut self) -> TransformResult<()> {
        Ok(())
    }

    fn create_transform(&mut self) -> TransformResult<SoftwareTransform> {
        Ok(SoftwareTransform::new())
    }

    fn shutdown(&mut self) {
        log::debug!("Software media subsystem shut down");
    }

    fn release_environment(&mut self) {
        self.environment_ready = false;
    }
}

pub struct SoftwareTransform {
    decoder: Option<Box<dyn Decoder>>,
    sample_buffer: Option<SampleBuffer<f32>>,
    input_type: Option<InputMediaType>,
    output_selected: bool,
    streaming: bool,
    /// Raw AAC payload of the submitted frame, ADTS header stripped.
    pending: Option<Vec<u8>>,
    format_changed: bool,
}

impl SoftwareTransform {
    pub fn new() -> Self {
        Self {
            decoder: None,
            sample_buffer: None,
            input_type: None,
            output_selected: false,
            streaming: false,
            pending: None,
            format_changed: false,
        }
    }
}

impl Default for SoftwareTransform {
    fn default() -> Self {
        Self::new()
    }
}

fn channel_layout(channels: u8) -> Option<Channels> {
    match channels {
        1 => Some(Channels::FRONT_CENTRE),
        2 => Some(Channels::FRONT_LEFT | Channels::FRONT_RIGHT),
        _ => None,
    }
}

/// Whether `buf` can take `frames` frames of `spec` without reallocating.
fn fits(buf: &SampleBuffer<f32>, frames: usize, spec: &SignalSpec) -> bool {
    buf.capacity() >= frames * spec.channels.count()
}

/// Output status reported for a failed packet decode.
fn error_status(err: &SymphoniaError) -> OutputStatus {
    match err {
        SymphoniaError::DecodeError(e) => {
            log::warn!("AAC decode error, frame dropped: {}", e);
            OutputStatus::NeedMoreInput
        }
        SymphoniaError::ResetRequired => OutputStatus::NeedReconfig,
        e => {
            log::error!("AAC decoder failed: {}", e);
            OutputStatus::Fatal
        }
    }
}

impl Transform for SoftwareTransform {
    fn stream_ids(&mut self) -> TransformResult<StreamIds> {
        Err(TransformError::NotImplemented)
    }

    fn set_input_type(&mut self, _stream: u32, media: &InputMediaType) -> TransformResult<()> {
        if media.payload != AacPayload::Adts {
            return Err(TransformError::Rejected("only ADTS payloads are decoded".into()));
        }
        let layout = channel_layout(media.channels).ok_or_else(|| {
            TransformError::Rejected(format!("unsupported channel count {}", media.channels))
        })?;

        let mut codec_params = CodecParameters::new();
        codec_params
            .for_codec(CODEC_TYPE_AAC)
            .with_sample_rate(media.sample_rate)
            .with_channels(layout);

        let decoder = get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| TransformError::Backend(format!("Failed to create AAC decoder: {}", e)))?;

        self.decoder = Some(decoder);
        self.sample_buffer = None;
        self.input_type = Some(*media);
        self.streaming = false;
        self.pending = None;
        self.format_changed = false;
        Ok(())
    }

    fn set_output_type(&mut self, _stream: u32, media: OutputMediaType) -> TransformResult<()> {
        match media {
            OutputMediaType::Float32 => self.output_selected = true,
        }
        Ok(())
    }

    fn begin_streaming(&mut self) -> TransformResult<()> {
        if self.decoder.is_none() || !self.output_selected {
            return Err(TransformError::Rejected("media types not selected".into()));
        }
        self.streaming = true;
        Ok(())
    }

    fn submit(&mut self, _stream: u32, sample: &InputSample) -> InputStatus {
        if !self.streaming {
            log::error!("Input submitted before streaming started");
            return InputStatus::Fatal;
        }
        if self.pending.is_some() || self.format_changed {
            return InputStatus::NotAccepted;
        }
        let Some(header) = parse_adts(&sample.data) else {
            log::warn!("Dropping frame without ADTS header");
            return InputStatus::Fatal;
        };

        if let Some(current) = &self.input_type {
            if current.channels != header.channels || current.sample_rate != header.samplerate {
                self.format_changed = true;
                return InputStatus::Ok;
            }
        }

        let start = header.header_len();
        let end = usize::from(header.length).min(sample.data.len());
        if start >= end {
            log::warn!("Dropping empty ADTS frame");
            return InputStatus::Ok;
        }
        self.pending = Some(sample.data[start..end].to_vec());
        InputStatus::Ok
    }

    fn receive(&mut self, _stream: u32) -> (OutputStatus, Option<Vec<f32>>) {
        if self.format_changed {
            self.format_changed = false;
            return (OutputStatus::NeedReconfig, None);
        }
        let Some(payload) = self.pending.take() else {
            return (OutputStatus::NeedMoreInput, None);
        };
        let Some(decoder) = self.decoder.as_mut() else {
            return (OutputStatus::Fatal, None);
        };

        let packet = Packet::new_from_slice(0, 0, 0, &payload);
        let err = match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let frames = decoded.capacity();
                let reuse = self
                    .sample_buffer
                    .as_ref()
                    .is_some_and(|buf| fits(buf, frames, &spec));
                if !reuse {
                    self.sample_buffer = None;
                }
                let buf = self
                    .sample_buffer
                    .get_or_insert_with(|| SampleBuffer::<f32>::new(frames as u64, spec));
                buf.copy_interleaved_ref(decoded);
                return (OutputStatus::Ok, Some(buf.samples().to_vec()));
            }
            Err(e) => e,
        };

        let status = error_status(&err);
        if status == OutputStatus::NeedReconfig {
            decoder.reset();
        }
        (status, None)
    }

    fn flush(&mut self) -> TransformResult<()> {
        self.pending = None;
        self.format_changed = false;
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.reset();
        }
        Ok(())
    }
}
