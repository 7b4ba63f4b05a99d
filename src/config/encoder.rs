//! Opusエンコーダに関する設定値
use serde::Deserialize;

/// Opusのアプリケーション種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpusApplicationSetting {
    Voip,
    Audio,
    LowDelay,
}

impl OpusApplicationSetting {
    pub fn to_opus(self) -> audiopus::Application {
        match self {
            OpusApplicationSetting::Voip => audiopus::Application::Voip,
            OpusApplicationSetting::Audio => audiopus::Application::Audio,
            OpusApplicationSetting::LowDelay => audiopus::Application::LowDelay,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncoderConfig {
    pub application: OpusApplicationSetting,
    pub target_bitrate_kbps: u32,
}
