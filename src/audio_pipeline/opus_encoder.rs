use audiopus::coder::Encoder as OpusEncoder;
use audiopus::{Application, Bitrate, Channels, SampleRate};
use bytes::Bytes;
use tracing::debug;

use super::error::EncoderError;
use super::format::PcmFormat;

/// Opusエンコーダーラッパー
pub struct OpusAudioEncoder {
    encoder: OpusEncoder,
    packet_buf: Vec<u8>,
}

impl OpusAudioEncoder {
    /// 新しいOpusエンコーダーを作成
    pub fn new(
        format: PcmFormat,
        application: Application,
        target_bitrate_kbps: u32,
    ) -> Result<Self, EncoderError> {
        let opus_channels = match format.channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            other => return Err(EncoderError::UnsupportedChannels(other)),
        };

        let opus_sample_rate = match format.sample_rate_hz {
            8000 => SampleRate::Hz8000,
            12000 => SampleRate::Hz12000,
            16000 => SampleRate::Hz16000,
            24000 => SampleRate::Hz24000,
            48000 => SampleRate::Hz48000,
            other => return Err(EncoderError::UnsupportedSampleRate(other)),
        };

        if format.bits_per_sample != 16 {
            return Err(EncoderError::UnsupportedBitsPerSample(
                format.bits_per_sample,
            ));
        }

        let mut encoder = OpusEncoder::new(opus_sample_rate, opus_channels, application)
            .map_err(EncoderError::Init)?;
        encoder
            .set_bitrate(Bitrate::BitsPerSecond(target_bitrate_kbps as i32 * 1000))
            .map_err(EncoderError::Init)?;

        Ok(Self {
            encoder,
            // 圧縮後サイズの上限として生データ1秒分を確保
            packet_buf: vec![0u8; format.bytes_per_second() as usize],
        })
    }

    /// 1フレーム分のインターリーブ済みS16サンプルを1パケットにエンコード
    pub fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, EncoderError> {
        let written = self
            .encoder
            .encode(pcm, &mut self.packet_buf)
            .map_err(EncoderError::Encode)?;

        debug!(samples = pcm.len(), packet_size = written, "Opusエンコード完了");

        Ok(Bytes::copy_from_slice(&self.packet_buf[..written]))
    }
}
