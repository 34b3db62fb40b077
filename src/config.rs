use serde::{Deserialize, Serialize};

use crate::audio::DecoderBackend;

#[derive(Debug, Serialize, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 内存区域配置
    pub fcram_base: u32,
    pub fcram_size: u32,

    // 解码器配置
    pub decoder: DecoderConfig,
}

/// Runtime settings for the decoder adapter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Which decoder implementation `create_decoder` builds
    pub backend: DecoderBackend,
    /// Total submissions of one frame while the transform keeps rejecting it,
    /// first attempt included; 0 keeps submitting until it is accepted
    #[serde(default)]
    pub max_input_retries: u32,
    /// Flush-and-restart cycles allowed per request after a format change;
    /// 0 gives up on the first `NeedReconfig`
    #[serde(default = "default_reconfigure_attempts")]
    pub max_reconfigure_attempts: u32,
}

fn default_reconfigure_attempts() -> u32 {
    8
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            backend: DecoderBackend::Software,
            max_input_retries: 0,
            max_reconfigure_attempts: default_reconfigure_attempts(),
        }
    }
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            fcram_base: env!("FCRAM_BASE").parse()
                .map_err(|_| "Failed to parse FCRAM_BASE")?,
            fcram_size: env!("FCRAM_SIZE").parse()
                .map_err(|_| "Failed to parse FCRAM_SIZE")?,

            decoder: DecoderConfig {
                backend: env!("DECODER_BACKEND").parse()
                    .map_err(|_| "Failed to parse DECODER_BACKEND")?,
                max_input_retries: env!("DECODER_MAX_INPUT_RETRIES").parse()
                    .map_err(|_| "Failed to parse DECODER_MAX_INPUT_RETRIES")?,
                max_reconfigure_attempts: env!("DECODER_MAX_RECONFIGURE_ATTEMPTS").parse()
                    .map_err(|_| "Failed to parse DECODER_MAX_RECONFIGURE_ATTEMPTS")?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
