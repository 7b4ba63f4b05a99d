//! 音声入力とフレーミングに関する設定値
use serde::Deserialize;

use crate::audio_pipeline::PcmFormat;

use super::ConfigError;

/// 受け付けるサンプルレート（Hz）
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];

#[derive(Debug, Clone, Deserialize)]
pub struct AudioProcessingConfig {
    pub input: InputFormat,
    pub framing: FramingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputFormat {
    pub sample_rate_hz: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FramingConfig {
    pub frame_duration_ms: f64,
}

impl InputFormat {
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate_hz, self.channels, self.bits_per_sample)
    }
}

impl AudioProcessingConfig {
    /// 受け付け可能なフォーマットか検証する（バッファ本体は検証しない）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.input.sample_rate_hz) {
            return Err(ConfigError::Invalid(format!(
                "unsupported sample rate: {}",
                self.input.sample_rate_hz
            )));
        }
        if !(1..=2).contains(&self.input.channels) {
            return Err(ConfigError::Invalid(format!(
                "unsupported channel count: {}",
                self.input.channels
            )));
        }
        if self.input.bits_per_sample != 16 {
            return Err(ConfigError::Invalid(format!(
                "unsupported bits per sample: {}",
                self.input.bits_per_sample
            )));
        }
        Ok(())
    }

    /// 設定上の1フレームあたりバイト数
    pub fn frame_bytes(&self) -> usize {
        (self.input.pcm_format().bytes_per_second() as f64 * self.framing.frame_duration_ms
            / 1_000.0) as usize
    }
}
