//! Configures the transform's media types once per stream.

use super::adts::StreamMeta;
use super::transform::{
    InputMediaType, OutputMediaType, StreamIds, Transform, TransformResult,
};

#[derive(Debug, Default)]
pub struct StreamNegotiator {
    format_selected: bool,
}

impl StreamNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.format_selected
    }

    /// Forget the current configuration; the next frame renegotiates.
    pub fn reset(&mut self) {
        self.format_selected = false;
    }

    /// Select input and output types and start streaming, unless that
    /// already happened for the current stream.
    pub fn ensure_configured<T: Transform>(
        &mut self,
        transform: &mut T,
        ids: StreamIds,
        meta: &StreamMeta,
    ) -> TransformResult<()> {
        if self.format_selected {
            return Ok(());
        }

        log::debug!(
            "New ADTS stream: channels = {}, sample rate = {}",
            meta.channels(),
            meta.sample_rate()
        );
        configure(transform, ids, meta)?;
        self.format_selected = true;
        Ok(())
    }
}

fn configure<T: Transform>(
    transform: &mut T,
    ids: StreamIds,
    meta: &StreamMeta,
) -> TransformResult<()> {
    transform.set_input_type(ids.input, &InputMediaType::adts(meta))?;
    transform.set_output_type(ids.output, OutputMediaType::Float32)?;
    transform.begin_streaming()
}
