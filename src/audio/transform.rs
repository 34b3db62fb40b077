//! Capability interface over the platform audio transform.
//!
//! The adapter only ever talks to a codec session through these traits, so
//! the platform decoder, the software decoder and test doubles are
//! interchangeable.

use thiserror::Error;

use super::adts::StreamMeta;

/// Codec-specific user data length: 12 byte wave-info block + 2 byte tag.
pub const AAC_USER_DATA_LEN: u32 = 14;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The operation is not offered by this transform.
    #[error("not implemented")]
    NotImplemented,
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("backend error: {0}")]
    Backend(String),
}

pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// Outcome of the environment initialization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    Initialized,
    /// Someone else initialized the environment first; still usable.
    AlreadyInitialized,
}

/// Result of handing one compressed sample to the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    Ok,
    /// The transform still holds output and cannot take input right now.
    NotAccepted,
    Fatal,
}

/// Result of one output request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    Ok,
    HaveMoreData,
    NeedReconfig,
    NeedMoreInput,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPayload {
    Raw,
    Adts,
}

/// Compressed input type selected on the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMediaType {
    pub channels: u8,
    pub sample_rate: u32,
    pub aac_tag: u16,
    pub payload: AacPayload,
    pub user_data_len: u32,
}

impl InputMediaType {
    pub fn adts(meta: &StreamMeta) -> Self {
        Self {
            channels: meta.channels(),
            sample_rate: meta.sample_rate(),
            aac_tag: meta.aac_tag,
            payload: AacPayload::Adts,
            user_data_len: AAC_USER_DATA_LEN,
        }
    }
}

/// Decoded output type. Only interleaved 32-bit float is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMediaType {
    Float32,
}

/// One compressed frame as handed to the transform.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSample {
    pub data: Vec<u8>,
    pub duration: i64,
    pub timestamp: i64,
    pub clean_point: bool,
}

impl InputSample {
    /// Wrap a frame as an untimed random-access point.
    pub fn clean_point(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            duration: 0,
            timestamp: 0,
            clean_point: true,
        }
    }
}

/// Identifiers of the transform's input and output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamIds {
    pub input: u32,
    pub output: u32,
}

pub trait Transform {
    fn stream_ids(&mut self) -> TransformResult<StreamIds>;

    fn set_input_type(&mut self, stream: u32, media: &InputMediaType) -> TransformResult<()>;

    fn set_output_type(&mut self, stream: u32, media: OutputMediaType) -> TransformResult<()>;

    fn begin_streaming(&mut self) -> TransformResult<()>;

    fn submit(&mut self, stream: u32, sample: &InputSample) -> InputStatus;

    /// Pull decoded output. Samples, when present, are interleaved f32.
    fn receive(&mut self, stream: u32) -> (OutputStatus, Option<Vec<f32>>);

    fn flush(&mut self) -> TransformResult<()>;
}

/// The platform media environment that hands out transforms.
pub trait MediaSubsystem {
    type Transform: Transform;

    /// Per-thread environment setup.
    fn init_environment(&mut self) -> TransformResult<Startup>;

    fn startup(&mut self) -> TransformResult<()>;

    fn create_transform(&mut self) -> TransformResult<Self::Transform>;

    fn shutdown(&mut self);

    fn release_environment(&mut self);
}
