//! 再フレーミング・エンコード処理のエラー定義
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FramingError {
    /// 固定長の格納領域に空きがない。バッファ側は一切変更されない
    #[error("append of {requested} bytes exceeds free space ({free} bytes left)")]
    AtCapacity { requested: usize, free: usize },
    /// フォーマットとフレーム長の組み合わせが整数バイトのフレームにならない
    #[error("frame size is not a whole number of bytes ({bytes_per_second} B/s at {frame_duration_ms} ms)")]
    FractionalFrameSize {
        bytes_per_second: u32,
        frame_duration_ms: f64,
    },
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("unsupported sample rate: {0}")]
    UnsupportedSampleRate(u32),
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),
    #[error("unsupported bits per sample: {0}")]
    UnsupportedBitsPerSample(u8),
    #[error("opus encoder init failed: {0}")]
    Init(#[source] audiopus::Error),
    #[error("opus encode failed: {0}")]
    Encode(#[source] audiopus::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported frame duration: {0} ms")]
    UnsupportedFrameDuration(f64),
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),
}
