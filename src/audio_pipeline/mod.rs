mod error;
mod format;
mod frame_buffer;
mod opus_encoder;
mod utils;

use bytes::Bytes;

use crate::config::{AudioProcessingConfig, EncoderConfig};

use utils::s16le_to_samples;

pub use error::{EncoderError, FramingError, PipelineError};
pub use format::{FrameDuration, PcmFormat, ReferenceTime, TICKS_PER_MS};
pub use frame_buffer::{EncodeFrame, FrameBuffer};
pub use opus_encoder::OpusAudioEncoder;

/// タイムスタンプ付きのエンコード済みOpusパケット
#[derive(Debug, Clone)]
pub struct EncodedPacket {
    pub data: Bytes,
    pub start: ReferenceTime,
    pub stop: ReferenceTime,
}

/// 再フレーミングバッファとOpusエンコーダを結合したパイプライン
///
/// チャンクを1回投入するたびに、取り出せる全フレームをエンコードして返す。
pub struct OpusEncodePipeline {
    frame_buffer: FrameBuffer,
    encoder: OpusAudioEncoder,
}

impl OpusEncodePipeline {
    pub fn new(
        audio_cfg: &AudioProcessingConfig,
        encoder_cfg: &EncoderConfig,
    ) -> Result<Self, PipelineError> {
        let duration = FrameDuration::from_millis(audio_cfg.framing.frame_duration_ms).ok_or(
            PipelineError::UnsupportedFrameDuration(audio_cfg.framing.frame_duration_ms),
        )?;
        let format = audio_cfg.input.pcm_format();

        Ok(Self {
            frame_buffer: FrameBuffer::new(format, duration)?,
            encoder: OpusAudioEncoder::new(
                format,
                encoder_cfg.application.to_opus(),
                encoder_cfg.target_bitrate_kbps,
            )?,
        })
    }

    /// PCM(S16LE)チャンクを投入し、取り出せた全フレームをエンコードして返す
    ///
    /// 長さ1以下のパケットは無音区間の充填で送出不要のため含めない。
    pub fn push(
        &mut self,
        chunk: &[u8],
        chunk_start: ReferenceTime,
        chunk_stop: ReferenceTime,
    ) -> Result<Vec<EncodedPacket>, PipelineError> {
        self.frame_buffer.append(chunk, chunk_start, chunk_stop)?;

        let mut packets = Vec::new();
        while let Some(frame) = self.frame_buffer.next_frame() {
            let samples = s16le_to_samples(frame.data);
            let data = self.encoder.encode(&samples)?;
            if data.len() <= 1 {
                continue;
            }
            packets.push(EncodedPacket {
                data,
                start: frame.start,
                stop: frame.stop,
            });
        }
        Ok(packets)
    }

    pub fn pending_frames(&self) -> usize {
        self.frame_buffer.pending_frames()
    }

    /// バッファに滞留している時間（ミリ秒）
    pub fn buffered_ms(&self) -> f64 {
        self.frame_buffer.buffered_ms()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }
}
