//! Drains decoded output from the transform and converts it to s16 LE.

use super::transform::{OutputStatus, Transform};

/// Number of per-channel output buffers a response can carry.
pub const OUTPUT_CHANNELS: usize = 2;

/// Per-channel little-endian s16 output accumulated for one request.
pub type ChannelBuffers = [Vec<u8>; OUTPUT_CHANNELS];

/// Why a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Everything was drained; the transform wants the next frame.
    NeedMoreInput,
    /// The stream format changed; media types must be selected again.
    NeedReconfig,
    Fatal,
}

/// Pull output until the transform stops producing it.
///
/// `Ok` is handled like `HaveMoreData`: a transform that returned `Ok`
/// still holds output and refuses input until drained.
pub fn drain<T: Transform>(
    transform: &mut T,
    out_stream: u32,
    channels: usize,
    out: &mut ChannelBuffers,
) -> DrainOutcome {
    loop {
        let (status, samples) = transform.receive(out_stream);
        match status {
            OutputStatus::Ok | OutputStatus::HaveMoreData => {
                if let Some(samples) = samples {
                    append_s16le(&samples, channels, out);
                }
            }
            OutputStatus::NeedReconfig => return DrainOutcome::NeedReconfig,
            OutputStatus::NeedMoreInput => return DrainOutcome::NeedMoreInput,
            OutputStatus::Fatal => return DrainOutcome::Fatal,
        }
    }
}

/// Convert one interleaved f32 sample to s16: clamp, scale, truncate.
pub fn f32_to_s16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// De-interleave `samples` into per-channel s16 LE byte buffers.
///
/// Channels beyond [`OUTPUT_CHANNELS`] are dropped. A trailing partial
/// frame is converted channel by channel as far as it goes.
pub fn append_s16le(samples: &[f32], channels: usize, out: &mut ChannelBuffers) {
    if channels == 0 {
        return;
    }
    for frame in samples.chunks(channels) {
        for (channel, &sample) in frame.iter().enumerate().take(OUTPUT_CHANNELS) {
            out[channel].extend_from_slice(&f32_to_s16(sample).to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakeSubsystem;
    use crate::audio::transform::MediaSubsystem;

    #[test]
    fn stereo_conversion_clamps_and_splits() {
        let mut out = ChannelBuffers::default();
        append_s16le(&[0.5, -0.5, 1.5, -1.5], 2, &mut out);
        // 16383 = 0x3FFF, 32767 = 0x7FFF
        assert_eq!(out[0], vec![0xFF, 0x3F, 0xFF, 0x7F]);
        // -16383 = 0xC001, -32767 = 0x8001
        assert_eq!(out[1], vec![0x01, 0xC0, 0x01, 0x80]);
    }

    #[test]
    fn truncates_toward_zero() {
        assert_eq!(f32_to_s16(0.0), 0);
        assert_eq!(f32_to_s16(1.0), 32767);
        assert_eq!(f32_to_s16(-1.0), -32767);
        assert_eq!(f32_to_s16(0.99999), 32766);
        assert_eq!(f32_to_s16(f32::INFINITY), 32767);
    }

    #[test]
    fn mono_fills_only_first_channel() {
        let mut out = ChannelBuffers::default();
        append_s16le(&[0.25, 0.25, 0.25], 1, &mut out);
        assert_eq!(out[0].len(), 6);
        assert!(out[1].is_empty());
    }

    #[test]
    fn extra_channels_are_dropped() {
        let mut out = ChannelBuffers::default();
        append_s16le(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 3, &mut out);
        assert_eq!(out[0].len(), 4);
        assert_eq!(out[1].len(), 4);
    }

    #[test]
    fn drain_continues_through_ok_and_more_data() {
        let mut fake = FakeSubsystem::new();
        let script = fake.script();
        script
            .borrow_mut()
            .output(OutputStatus::Ok, Some(vec![0.1, 0.1]))
            .output(OutputStatus::HaveMoreData, Some(vec![0.2, 0.2]))
            .output(OutputStatus::NeedMoreInput, None);
        let mut transform = fake.create_transform().unwrap();

        let mut out = ChannelBuffers::default();
        let outcome = drain(&mut transform, 0, 2, &mut out);

        assert_eq!(outcome, DrainOutcome::NeedMoreInput);
        assert_eq!(out[0].len(), 4);
        assert_eq!(out[1].len(), 4);
        assert_eq!(script.borrow().receive_calls, 3);
    }

    #[test]
    fn drain_stops_on_reconfig_and_fatal() {
        let mut fake = FakeSubsystem::new();
        let script = fake.script();
        script
            .borrow_mut()
            .output(OutputStatus::NeedReconfig, None)
            .output(OutputStatus::Fatal, None);
        let mut transform = fake.create_transform().unwrap();

        let mut out = ChannelBuffers::default();
        assert_eq!(drain(&mut transform, 0, 2, &mut out), DrainOutcome::NeedReconfig);
        assert_eq!(drain(&mut transform, 0, 2, &mut out), DrainOutcome::Fatal);
        assert!(out[0].is_empty());
    }
}
